//! Command-line interface definition.
use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

/// Top-level CLI entry point for the build orchestration helpers.
#[derive(Parser, Debug)]
#[command(
    name = "ptools",
    about = "Build orchestration helpers: artifacts, coverage, source cleanup and environment bootstrap",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect build artifacts and optionally generate coverage reports
    PostBuild(PostBuildOpts),
    /// Remove unused includes and format sources
    PreBuild(PreBuildOpts),
    /// Check tools and fetch external dependencies from a requirements file
    Bootstrap(BootstrapOpts),
    /// Copy files by extension, or a single file, into a directory
    Copy(CopyOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file of this subcommand.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::PostBuild(_) => "post-build",
            Self::PreBuild(_) => "pre-build",
            Self::Bootstrap(_) => "bootstrap",
            Self::Copy(_) => "copy",
            Self::Version => "version",
        }
    }
}

/// Options for the `post-build` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PostBuildOpts {
    /// Output directory (reset before copying)
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Binary directory holding one folder per project
    #[arg(short, long)]
    pub bin_dir: PathBuf,

    /// Comma-separated build projects
    #[arg(short, long, default_value = "")]
    pub proj: String,

    /// Comma-separated test projects
    #[arg(short, long, default_value = "")]
    pub test_proj: String,

    /// Run test projects and generate a coverage report
    #[arg(short, long)]
    pub coverage: bool,

    /// Source root passed to the coverage tool
    #[arg(long, default_value = ".")]
    pub coverage_root: PathBuf,

    /// Parallel jobs for the coverage tool
    #[arg(long, default_value_t = 12)]
    pub coverage_jobs: usize,

    /// Directories excluded from the coverage report
    #[arg(long, default_value = "./extern")]
    pub coverage_exclude: Vec<String>,

    /// Coverage report generator
    #[arg(long, default_value = "gcovr")]
    pub coverage_tool: String,
}

/// Options for the `pre-build` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PreBuildOpts {
    /// Binary directory holding `iwyu.log`
    #[arg(short, long)]
    pub bin_dir: PathBuf,

    /// Comma-separated include directories
    #[arg(short, long, default_value = "")]
    pub include_dirs: String,

    /// Comma-separated source files to clean up
    #[arg(short, long)]
    pub source_files: String,

    /// Language standard
    #[arg(long)]
    pub std: String,

    /// Include mapping file
    #[arg(long)]
    pub mapping_file: Option<PathBuf>,

    /// clang-format style file
    #[arg(long)]
    pub style_file: Option<PathBuf>,

    /// Python interpreter running the include fixer
    #[arg(long, default_value = "python3")]
    pub python: String,

    /// Path to the include fixer script
    #[arg(long, default_value = "fix_includes.py")]
    pub fix_includes: PathBuf,
}

/// Options for the `bootstrap` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BootstrapOpts {
    /// JSON requirements file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Directory that relative paths resolve against (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Only check the tools listed in the requirements file
    #[arg(long = "no-baseline-tools", action = clap::ArgAction::SetFalse)]
    pub baseline_tools: bool,
}

/// Options for the `copy` subcommand.
#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("what").required(true).args(["file", "ext"])))]
pub struct CopyOpts {
    /// Output directory
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Single file to copy
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Directory to search
    #[arg(short, long, default_value = ".", conflicts_with = "file")]
    pub src_dir: PathBuf,

    /// Comma-separated extensions to copy
    #[arg(short, long)]
    pub ext: Option<String>,

    /// Search subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Keep paths relative to the search directory
    #[arg(short, long)]
    pub keep_paths: bool,

    /// Replace path separators with `_` (requires --keep-paths)
    #[arg(long, requires = "keep_paths")]
    pub flatten: bool,

    /// Overwrite existing files
    #[arg(long)]
    pub overwrite: bool,

    /// Delete the output directory first
    #[arg(long)]
    pub clear: bool,
}
