//! Shared state handed to every bootstrap phase.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::BootstrapConfig;
use crate::config::requirements::{Requirements, resolve};
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::download::Downloader;

/// Shared context for bootstrap task execution.
pub struct Context {
    /// Validated requirements document.
    pub requirements: Arc<Requirements>,
    /// Command configuration (root directory, baseline tools).
    pub config: BootstrapConfig,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// HTTP downloader (for testing or real downloads).
    pub downloader: Arc<dyn Downloader>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("requirements", &self.requirements)
            .field("config", &self.config)
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field("downloader", &"<dyn Downloader>")
            .finish()
    }
}

impl Context {
    /// Creates a new context for task execution.
    #[must_use]
    pub fn new(
        requirements: Requirements,
        config: BootstrapConfig,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            requirements: Arc::new(requirements),
            config,
            log,
            executor,
            downloader,
        }
    }

    /// Directory relative paths resolve against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Resolve a path from the requirements against the root.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        resolve(self.root(), path)
    }
}
