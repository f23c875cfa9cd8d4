//! Command: prepare the development environment from a requirements document.
use anyhow::{Context as _, Result};
use std::sync::Arc;

use super::version::{line, version};
use crate::cli::BootstrapOpts;
use crate::config::BootstrapConfig;
use crate::config::requirements::Requirements;
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::resources::download::HttpDownloader;
use crate::tasks::{self, Context};

/// Run the bootstrap command.
///
/// The requirements are loaded and validated as a whole before the first
/// phase runs. The task summary is printed whether or not a phase fails.
///
/// # Errors
///
/// Returns an error if the requirements are invalid or a phase fails.
pub fn run(opts: &BootstrapOpts, log: &Arc<Logger>) -> Result<()> {
    let config = BootstrapConfig::from_opts(opts)?;
    log.info(&line(version()));

    log.stage("Loading requirements");
    let requirements = Requirements::load(&config.requirements)
        .with_context(|| format!("loading {}", config.requirements.display()))?;
    log.info(&format!(
        "{} tool(s), {} reset(s), {} repo(s), {} resource(s), {} deletion(s)",
        requirements.tools.len(),
        requirements.reset.len(),
        requirements.git.len(),
        requirements.wget.len(),
        requirements.delete.len()
    ));
    log.debug(&format!("root: {}", config.root.display()));

    let ctx = Context::new(
        requirements,
        config,
        Arc::clone(log) as Arc<dyn Log>,
        Arc::new(SystemExecutor),
        Arc::new(HttpDownloader),
    );
    let result = tasks::run_all(&tasks::all_bootstrap_tasks(), &ctx);
    log.print_summary();
    result
}
