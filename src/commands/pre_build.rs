//! Source clean-up before a build: drop unused includes, then format.
use anyhow::{Context as _, Result};
use std::path::Path;

use crate::cli::PreBuildOpts;
use crate::config::PreBuildConfig;
use crate::error::ToolError;
use crate::exec::{Executor, LogFiles, SystemExecutor, path_arg};
use crate::fs::to_posix;
use crate::logging::{Log, Logger};

/// Run the pre-build command.
///
/// # Errors
///
/// Returns an error if the options are invalid or either tool fails.
pub fn run(opts: &PreBuildOpts, log: &Logger) -> Result<()> {
    let config = PreBuildConfig::from_opts(opts)?;
    cleanup(&config, &SystemExecutor, log)
}

/// Run the include fixer then the formatter.
///
/// # Errors
///
/// Returns [`ToolError::Failed`] if either tool exits non-zero, or an error
/// if a tool cannot be started.
pub fn cleanup(config: &PreBuildConfig, executor: &dyn Executor, log: &dyn Log) -> Result<()> {
    log.debug(&format!("include directories: {}", config.include_dirs.join(", ")));
    log.debug(&format!("language standard: {}", config.std));
    if let Some(mapping) = &config.mapping_file {
        log.debug(&format!("mapping file: {}", mapping.display()));
    }

    log.stage("Fixing includes");
    fix_includes(config, executor, log)?;

    log.stage("Formatting sources");
    format_sources(config, executor, log)
}

fn fix_includes(config: &PreBuildConfig, executor: &dyn Executor, log: &dyn Log) -> Result<()> {
    let script = path_arg(&config.fix_includes);
    let ignore = format!(r"{}(/extern/|\\extern\\).*", to_posix(&config.bin_dir));
    let iwyu_log = path_arg(&config.bin_dir.join("iwyu.log"));
    let args = [
        script.as_str(),
        "--nosafe_headers",
        "--ignore_re",
        &ignore,
        &iwyu_log,
    ];
    let logs = LogFiles::in_dir(&config.bin_dir, "iwyu_cleanup").with_header();
    run_tool(executor, "include fixer", &config.python, &args, &logs, &logs.stdout)?;
    log.info(&format!("includes fixed, log: {}", logs.stdout.display()));
    Ok(())
}

fn format_sources(config: &PreBuildConfig, executor: &dyn Executor, log: &dyn Log) -> Result<()> {
    let style = config.style_file.as_deref().map_or_else(
        || "-style=file".to_string(),
        |style| format!("-style=file:{}", to_posix(style)),
    );
    let files: Vec<String> = config.source_files.iter().map(|f| path_arg(f)).collect();
    let mut args = vec![style.as_str(), "-i"];
    args.extend(files.iter().map(String::as_str));

    let logs = LogFiles::in_dir(&config.bin_dir, "clang_format");
    run_tool(executor, "clang-format", "clang-format", &args, &logs, &logs.stderr)?;
    log.info(&format!(
        "{} file(s) formatted, log: {}",
        config.source_files.len(),
        logs.stdout.display()
    ));
    Ok(())
}

/// Run `program` with its output captured in `logs`; a non-zero exit is
/// reported as [`ToolError::Failed`] pointing at `report`.
fn run_tool(
    executor: &dyn Executor,
    tool: &str,
    program: &str,
    args: &[&str],
    logs: &LogFiles,
    report: &Path,
) -> Result<()> {
    let result = executor
        .run_logged(program, args, logs)
        .with_context(|| format!("running {tool}"))?;
    if !result.success {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            code: result.code.unwrap_or(-1),
            log: report.to_path_buf(),
        }
        .into());
    }
    Ok(())
}
