//! Source discovery and destination planning.
//!
//! Planning never touches the output tree, so every collision is reported
//! before the first byte is written.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{CopySource, CopySpec};
use crate::error::CopyError;
use crate::fs::to_posix;

/// One file scheduled for copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PlannedCopy {
    /// File to read.
    pub source: PathBuf,
    /// Path relative to the search root, `/`-separated.
    pub relative: String,
    /// File to write.
    pub destination: PathBuf,
}

/// Build the ordered list of copies described by `spec`.
pub(super) fn plan(spec: &CopySpec) -> Result<Vec<PlannedCopy>, CopyError> {
    match &spec.source {
        CopySource::File(path) => plan_single(path, &spec.output_dir).map(|p| vec![p]),
        CopySource::Extensions { root, extensions } => plan_extensions(spec, root, extensions),
    }
}

fn plan_single(path: &Path, output_dir: &Path) -> Result<PlannedCopy, CopyError> {
    if !path.is_file() {
        return Err(CopyError::NotFound(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .ok_or_else(|| CopyError::NotFound(path.to_path_buf()))?;
    Ok(PlannedCopy {
        source: path.to_path_buf(),
        relative: name.to_string_lossy().into_owned(),
        destination: output_dir.join(name),
    })
}

fn plan_extensions(
    spec: &CopySpec,
    root: &Path,
    extensions: &[String],
) -> Result<Vec<PlannedCopy>, CopyError> {
    if extensions.is_empty() {
        return Err(CopyError::EmptyExtensions);
    }
    if !root.is_dir() {
        return Err(CopyError::SourceNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    walk(root, spec.recursive, &mut files)?;

    let mut planned: Vec<PlannedCopy> = Vec::new();
    // destination -> (name used in messages, source)
    let mut claimed: HashMap<PathBuf, (String, PathBuf)> = HashMap::new();

    for ext in extensions {
        let suffix = format!(".{ext}");
        for source in files.iter().filter(|f| has_suffix(f, &suffix)) {
            let relative = source
                .strip_prefix(root)
                .map_or_else(|_| source.clone(), Path::to_path_buf);
            let relative = to_posix(&relative);
            let (name, destination) = destination_for(spec, source, &relative);

            if let Some((_, first)) = claimed.get(&destination) {
                if first == source {
                    continue;
                }
                return Err(CopyError::NameCollision {
                    name,
                    root: root.to_path_buf(),
                    first: first.clone(),
                    second: source.clone(),
                });
            }
            claimed.insert(destination.clone(), (name, source.clone()));
            planned.push(PlannedCopy {
                source: source.clone(),
                relative,
                destination,
            });
        }
    }
    Ok(planned)
}

/// Destination path and the name it is known by in collision messages.
fn destination_for(spec: &CopySpec, source: &Path, relative: &str) -> (String, PathBuf) {
    if spec.keep_paths {
        let name = if spec.flatten {
            relative.replace('/', "_")
        } else {
            relative.to_string()
        };
        let destination = spec.output_dir.join(&name);
        (name, destination)
    } else {
        let name = source
            .file_name()
            .map_or_else(|| relative.to_string(), |n| n.to_string_lossy().into_owned());
        let destination = spec.output_dir.join(&name);
        (name, destination)
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(suffix))
}

/// Collect regular files under `dir`, sorted by name at each level.
///
/// Directory symlinks are not descended into; file symlinks are kept.
fn walk(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), CopyError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| CopyError::io("reading directory", dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CopyError::io("reading directory", dir, e))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| CopyError::io("inspecting", &path, e))?;
        if file_type.is_dir() {
            if recursive {
                walk(&path, recursive, out)?;
            }
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, rel).unwrap();
    }

    fn extensions(root: &Path, out: &Path, exts: &[&str]) -> CopySpec {
        CopySpec::extensions(
            root,
            exts.iter().map(ToString::to_string).collect(),
            out,
        )
    }

    #[test]
    fn walk_is_sorted_and_shallow_by_default() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.o");
        touch(dir.path(), "a.o");
        touch(dir.path(), "sub/c.o");

        let mut files = Vec::new();
        walk(dir.path(), false, &mut files).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.o", "b.o"]);

        files.clear();
        walk(dir.path(), true, &mut files).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        assert!(has_suffix(Path::new("/x/app.exe"), ".exe"));
        assert!(!has_suffix(Path::new("/x/APP.EXE"), ".exe"));
        assert!(has_suffix(Path::new("/x/.hidden.gcno"), ".gcno"));
        assert!(!has_suffix(Path::new("/x/gcno"), ".gcno"));
    }

    #[test]
    fn plan_orders_by_extension_then_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.dll");
        touch(dir.path(), "a.dll");
        touch(dir.path(), "app.exe");
        let out = dir.path().join("out");

        let planned = plan(&extensions(dir.path(), &out, &["exe", "dll"])).unwrap();
        let relatives: Vec<_> = planned.iter().map(|p| p.relative.as_str()).collect();
        assert_eq!(relatives, ["app.exe", "a.dll", "b.dll"]);
        assert_eq!(planned[0].destination, out.join("app.exe"));
    }

    #[test]
    fn plan_flattens_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/b/c.o");
        let spec = extensions(dir.path(), &dir.path().join("out"), &["o"])
            .recursive(true)
            .keep_paths(true)
            .flatten(true);

        let planned = plan(&spec).unwrap();
        assert_eq!(planned[0].relative, "a/b/c.o");
        assert_eq!(planned[0].destination, dir.path().join("out").join("a_b_c.o"));
    }

    #[test]
    fn plan_deduplicates_overlapping_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bundle.tar.gz");
        let planned = plan(&extensions(dir.path(), &dir.path().join("out"), &["gz", "tar.gz"])).unwrap();
        assert_eq!(planned.len(), 1);
    }

    #[test]
    fn plan_single_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CopySpec::file(dir.path().join("nope.exe"), dir.path().join("out"));
        assert!(matches!(plan(&spec), Err(CopyError::NotFound(_))));
    }
}
