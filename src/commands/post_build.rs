//! Command: collect artifacts and coverage reports after a build.
use anyhow::Result;

use super::version::{line, version};
use crate::cli::PostBuildOpts;
use crate::config::PostBuildConfig;
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::pipeline::Pipeline;

/// Run the post-build command.
///
/// The task summary is printed whether or not the pipeline succeeds.
///
/// # Errors
///
/// Returns an error if the options are invalid or a project fails.
pub fn run(opts: &PostBuildOpts, log: &Logger) -> Result<()> {
    let config = PostBuildConfig::from_opts(opts)?;
    log.info(&line(version()));
    log.debug(&format!("output directory: {}", config.out_dir.display()));
    log.debug(&format!("binary directory: {}", config.bin_dir.display()));
    match &config.coverage {
        Some(coverage) => log.debug(&format!("coverage: {coverage:?}")),
        None => log.debug("coverage: off"),
    }

    let result = Pipeline::new(&config, &SystemExecutor, log).run();
    log.print_summary();
    result.map(|report| {
        log.debug(&format!("{} project(s) processed", report.projects.len()));
    })
}
