//! Git clone, optionally pinned to a commit.
use anyhow::Result;
use std::path::PathBuf;

use super::{Applicable, ResourceChange};
use crate::config::requirements::GitEntry;
use crate::error::FetchError;
use crate::exec::{Executor, path_arg};

/// A git repository cloned into a fresh directory, optionally pinned to a
/// commit.
#[derive(Debug)]
pub struct GitRepoResource<'a> {
    /// Repository entry from the requirements.
    pub entry: GitEntry,
    /// Checkout directory; must not exist yet.
    pub destination: PathBuf,
    /// Executor for running git.
    executor: &'a dyn Executor,
}

impl<'a> GitRepoResource<'a> {
    /// Create a new git repository resource.
    #[must_use]
    pub const fn new(entry: GitEntry, destination: PathBuf, executor: &'a dyn Executor) -> Self {
        Self {
            entry,
            destination,
            executor,
        }
    }

    fn git_error(&self, e: &anyhow::Error) -> FetchError {
        FetchError::Git {
            name: self.entry.name.clone(),
            message: format!("{e:#}"),
        }
    }
}

impl Applicable for GitRepoResource<'_> {
    fn description(&self) -> String {
        match &self.entry.hash {
            Some(hash) => format!("{} @ {hash}", self.entry.name),
            None => self.entry.name.clone(),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.destination.symlink_metadata().is_ok() {
            return Err(FetchError::DestinationExists {
                name: self.entry.name.clone(),
                path: self.destination.clone(),
            }
            .into());
        }
        crate::fs::ensure_parent_dir(&self.destination)?;

        let dest = path_arg(&self.destination);
        self.executor
            .run("git", &["clone", &self.entry.repo, &dest])
            .map_err(|e| self.git_error(&e))?;

        if let Some(hash) = &self.entry.hash {
            self.executor
                .run_in(&self.destination, "git", &["checkout", hash])
                .map_err(|e| self.git_error(&e))?;
        }
        Ok(ResourceChange::Applied)
    }
}
