//! Directory reset.
use anyhow::Result;
use std::path::PathBuf;

use super::{Applicable, ResourceChange};

/// A directory that must exist and be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryResource {
    /// Directory to reset.
    pub path: PathBuf,
}

impl DirectoryResource {
    /// Create a new directory resource.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Applicable for DirectoryResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        crate::fs::reset_dir(&self.path)?;
        Ok(ResourceChange::Applied)
    }
}
