//! Copy engine: gather files by extension (or a single file) into an output
//! directory.
//!
//! A copy runs in three phases.  Planning discovers sources and computes
//! destinations, rejecting name collisions.  Preparation optionally clears
//! the output directory, creates it, and checks every destination.  Only
//! then are files written, so a failing copy leaves no partial output
//! behind (beyond the requested clear).
mod plan;

use std::path::{Path, PathBuf};

use crate::error::CopyError;
use crate::logging::Log;
use plan::{PlannedCopy, plan};

/// What to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopySource {
    /// A single file, copied with its metadata.
    File(PathBuf),
    /// Every file under `root` whose name ends with `.<ext>` for one of the
    /// extensions.
    Extensions {
        /// Directory to search.
        root: PathBuf,
        /// Extensions without the leading dot, searched in order.
        extensions: Vec<String>,
    },
}

/// A copy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySpec {
    /// Directory receiving the files.
    pub output_dir: PathBuf,
    /// Files to copy.
    pub source: CopySource,
    /// Descend into subdirectories of the search root.
    pub recursive: bool,
    /// Reproduce the path relative to the search root under `output_dir`.
    pub keep_paths: bool,
    /// With `keep_paths`, replace `/` in the relative path with `_`.
    pub flatten: bool,
    /// Replace destination files that already exist.
    pub overwrite: bool,
    /// Delete `output_dir` before copying.
    pub clear: bool,
}

impl CopySpec {
    /// Copy a single file into `output_dir`.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::new(CopySource::File(path.into()), output_dir.into())
    }

    /// Copy files matching `extensions` from `root` into `output_dir`.
    #[must_use]
    pub fn extensions(
        root: impl Into<PathBuf>,
        extensions: Vec<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            CopySource::Extensions {
                root: root.into(),
                extensions,
            },
            output_dir.into(),
        )
    }

    const fn new(source: CopySource, output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            source,
            recursive: false,
            keep_paths: false,
            flatten: false,
            overwrite: false,
            clear: false,
        }
    }

    /// Set [`CopySpec::recursive`].
    #[must_use]
    pub const fn recursive(mut self, value: bool) -> Self {
        self.recursive = value;
        self
    }

    /// Set [`CopySpec::keep_paths`].
    #[must_use]
    pub const fn keep_paths(mut self, value: bool) -> Self {
        self.keep_paths = value;
        self
    }

    /// Set [`CopySpec::flatten`].
    #[must_use]
    pub const fn flatten(mut self, value: bool) -> Self {
        self.flatten = value;
        self
    }

    /// Set [`CopySpec::overwrite`].
    #[must_use]
    pub const fn overwrite(mut self, value: bool) -> Self {
        self.overwrite = value;
        self
    }

    /// Set [`CopySpec::clear`].
    #[must_use]
    pub const fn clear(mut self, value: bool) -> Self {
        self.clear = value;
        self
    }
}

/// Parse a comma-separated extension list.
///
/// Entries are trimmed, a leading `.` is dropped and blank entries are
/// ignored.
///
/// # Errors
///
/// Returns [`CopyError::EmptyExtensions`] if no entry remains.
pub fn parse_extensions(list: &str) -> Result<Vec<String>, CopyError> {
    let extensions: Vec<String> = list
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect();
    if extensions.is_empty() {
        return Err(CopyError::EmptyExtensions);
    }
    Ok(extensions)
}

/// A file written by [`copy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    /// Source path relative to the search root, `/`-separated.
    pub relative: String,
    /// Path written.
    pub destination: PathBuf,
}

/// Files written by [`copy`], in copy order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyResult {
    /// One entry per written file.
    pub entries: Vec<CopyEntry>,
}

impl CopyResult {
    /// Number of files written.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destination paths in copy order.
    pub fn destinations(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.destination.as_path())
    }
}

/// Copy the files described by `spec`.
///
/// # Errors
///
/// Returns a [`CopyError`] on a missing source, a name collision, an
/// existing destination (extension copies without overwrite), or an I/O
/// failure.  Every error except I/O during
/// the final phase is raised before any file is written.
pub fn copy(spec: &CopySpec, log: &dyn Log) -> Result<CopyResult, CopyError> {
    let planned = plan(spec)?;
    prepare_output(spec)?;
    // A single file always replaces its destination.
    let single_file = matches!(spec.source, CopySource::File(_));
    validate_destinations(&planned, spec.overwrite || single_file)?;

    let preserve_metadata = single_file;
    let total = planned.len();
    let mut result = CopyResult::default();
    for (index, item) in planned.into_iter().enumerate() {
        write_one(&item, preserve_metadata)?;
        log.debug(&format!(
            "copied {} -> {} ({}/{total})",
            item.relative,
            item.destination.display(),
            index + 1
        ));
        result.entries.push(CopyEntry {
            relative: item.relative,
            destination: item.destination,
        });
    }
    log.info(&format!(
        "copied {total} file(s) to {}",
        spec.output_dir.display()
    ));
    Ok(result)
}

fn prepare_output(spec: &CopySpec) -> Result<(), CopyError> {
    let out = &spec.output_dir;
    if out.is_file() {
        return Err(CopyError::OutputIsFile(out.clone()));
    }
    if spec.clear && out.exists() {
        crate::fs::remove_dir_all_writable(out).map_err(|e| CopyError::Clear {
            path: out.clone(),
            message: format!("{e:#}"),
        })?;
    }
    std::fs::create_dir_all(out).map_err(|e| CopyError::io("creating", out, e))
}

fn validate_destinations(planned: &[PlannedCopy], overwrite: bool) -> Result<(), CopyError> {
    for item in planned {
        let dst = &item.destination;
        if dst.is_dir() {
            return Err(CopyError::DestinationIsDirectory(dst.clone()));
        }
        if !overwrite && dst.exists() {
            return Err(CopyError::DestinationExists(dst.clone()));
        }
    }
    Ok(())
}

fn write_one(item: &PlannedCopy, preserve_metadata: bool) -> Result<(), CopyError> {
    if let Some(parent) = item.destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CopyError::io("creating", parent, e))?;
    }
    let copied = if preserve_metadata {
        crate::fs::copy_file_with_metadata(&item.source, &item.destination)
    } else {
        std::fs::copy(&item.source, &item.destination)
    };
    copied
        .map(|_| ())
        .map_err(|e| CopyError::io("copying", &item.source, e))
}
