//! `ptools` entry point.
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use project_tools::cli::{Cli, Command};
use project_tools::commands;
use project_tools::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let command = args.command.log_name();
    logging::init_subscriber(args.verbose, command);
    let log = Arc::new(Logger::new(command));

    let result = match &args.command {
        Command::PostBuild(opts) => commands::post_build::run(opts, &log),
        Command::PreBuild(opts) => commands::pre_build::run(opts, &log),
        Command::Bootstrap(opts) => commands::bootstrap::run(opts, &log),
        Command::Copy(opts) => commands::copy::run(opts, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
