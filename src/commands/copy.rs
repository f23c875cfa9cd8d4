//! Command: copy files by extension or a single file.
use anyhow::Result;

use crate::cli::CopyOpts;
use crate::config::copy_spec_from_opts;
use crate::copy::copy;
use crate::logging::Logger;

/// Run the copy command.
///
/// # Errors
///
/// Returns an error if the options are invalid or the copy fails.
pub fn run(opts: &CopyOpts, log: &Logger) -> Result<()> {
    let spec = copy_spec_from_opts(opts)?;
    log.debug(&format!("copy request: {spec:?}"));
    let result = copy(&spec, log)?;
    if result.is_empty() {
        log.warn("no files matched, nothing copied");
    }
    Ok(())
}
