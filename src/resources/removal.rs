//! Glob-driven removal of files and directories.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{Applicable, ResourceChange};
use crate::error::ConfigError;

/// Every file or directory matching a glob pattern under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalResource {
    /// Pattern relative to `root` (e.g. `extern/**/.git`).
    pub pattern: String,
    /// Directory the pattern is anchored at.
    pub root: PathBuf,
}

impl RemovalResource {
    /// Create a new removal resource.
    #[must_use]
    pub const fn new(pattern: String, root: PathBuf) -> Self {
        Self { pattern, root }
    }

    /// Paths currently matching the pattern, deepest first.
    ///
    /// Hidden entries match wildcards; `*` does not cross `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or a directory cannot be
    /// read while matching.
    pub fn matches(&self) -> Result<Vec<PathBuf>> {
        let anchored = Path::new(&glob::Pattern::escape(&self.root.to_string_lossy()))
            .join(&self.pattern)
            .to_string_lossy()
            .into_owned();
        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let paths = glob::glob_with(&anchored, options).map_err(|e| ConfigError::InvalidPattern {
            pattern: self.pattern.clone(),
            message: e.msg.to_string(),
        })?;
        let mut matches = paths
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("matching {}", self.pattern))?;
        matches.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
        Ok(matches)
    }
}

impl Applicable for RemovalResource {
    fn description(&self) -> String {
        self.pattern.clone()
    }

    fn apply(&self) -> Result<ResourceChange> {
        let mut removed = 0usize;
        for path in self.matches()? {
            // Already gone with a parent removed earlier in this loop.
            if path.symlink_metadata().is_err() {
                continue;
            }
            crate::fs::remove_path(&path)?;
            removed += 1;
        }
        Ok(if removed == 0 {
            ResourceChange::AlreadyCorrect
        } else {
            ResourceChange::Applied
        })
    }
}
