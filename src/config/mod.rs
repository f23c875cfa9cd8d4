//! Explicit configuration for each subcommand.
//!
//! Command-line options are turned into these structs once, at process
//! entry, with every path made absolute.  Components receive them by
//! reference and never look at the command line themselves.
pub mod requirements;

use anyhow::{Context as _, Result};
use std::path::PathBuf;

use crate::cli::{BootstrapOpts, CopyOpts, PostBuildOpts, PreBuildOpts};
use crate::copy::{CopySpec, parse_extensions};
use crate::error::ConfigError;
use crate::fs::absolute;
use requirements::ToolRequirement;

/// Tools every bootstrap checks before the ones listed in the requirements.
pub const BASELINE_TOOLS: &[&str] = &["git", "cmake", "gcovr", "ninja", "tar"];

/// Split a comma-separated list, trimming entries and dropping blanks.
#[must_use]
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// One project handled by the artifact pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTask {
    /// Project name; also the folder under the binary directory.
    pub name: String,
    /// Whether the project builds a test executable.
    pub is_test: bool,
}

/// Settings for the coverage sub-pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageConfig {
    /// Report generator executable.
    pub tool: String,
    /// Source root handed to the generator.
    pub root: PathBuf,
    /// Parallel jobs for the generator.
    pub jobs: usize,
    /// Directories excluded from the report.
    pub exclude: Vec<String>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            tool: "gcovr".to_string(),
            root: PathBuf::from("."),
            jobs: 12,
            exclude: vec!["./extern".to_string()],
        }
    }
}

/// Configuration of the `post-build` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBuildConfig {
    /// Output directory, reset at the start of a run.
    pub out_dir: PathBuf,
    /// Directory holding one build folder per project.
    pub bin_dir: PathBuf,
    /// Projects whose artifacts are collected.
    pub projects: Vec<String>,
    /// Test projects; artifacts are collected and, with coverage, run.
    pub test_projects: Vec<String>,
    /// Coverage settings, `None` when coverage is off.
    pub coverage: Option<CoverageConfig>,
}

impl PostBuildConfig {
    /// Build the configuration from command-line options.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be made absolute.
    pub fn from_opts(opts: &PostBuildOpts) -> Result<Self> {
        let coverage = if opts.coverage {
            Some(CoverageConfig {
                tool: opts.coverage_tool.clone(),
                root: opts.coverage_root.clone(),
                jobs: opts.coverage_jobs,
                exclude: opts.coverage_exclude.clone(),
            })
        } else {
            None
        };
        Ok(Self {
            out_dir: absolute(&opts.out_dir)?,
            bin_dir: absolute(&opts.bin_dir)?,
            projects: split_list(&opts.proj),
            test_projects: split_list(&opts.test_proj),
            coverage,
        })
    }

    /// Build projects followed by test projects, in command-line order.
    #[must_use]
    pub fn tasks(&self) -> Vec<ProjectTask> {
        let build = self.projects.iter().map(|name| ProjectTask {
            name: name.clone(),
            is_test: false,
        });
        let test = self.test_projects.iter().map(|name| ProjectTask {
            name: name.clone(),
            is_test: true,
        });
        build.chain(test).collect()
    }
}

/// Configuration of the `pre-build` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreBuildConfig {
    /// Binary directory holding `iwyu.log` and receiving the tool logs.
    pub bin_dir: PathBuf,
    /// Include directories of the project.
    pub include_dirs: Vec<String>,
    /// Files to format.
    pub source_files: Vec<PathBuf>,
    /// Language standard.
    pub std: String,
    /// Include mapping file.
    pub mapping_file: Option<PathBuf>,
    /// clang-format style file.
    pub style_file: Option<PathBuf>,
    /// Python interpreter for the include fixer.
    pub python: String,
    /// Include fixer script.
    pub fix_includes: PathBuf,
}

impl PreBuildConfig {
    /// Build the configuration from command-line options.
    ///
    /// # Errors
    ///
    /// Returns an error if the source list is empty or a path cannot be
    /// made absolute.
    pub fn from_opts(opts: &PreBuildOpts) -> Result<Self> {
        let source_files: Vec<PathBuf> = split_list(&opts.source_files)
            .into_iter()
            .map(PathBuf::from)
            .collect();
        if source_files.is_empty() {
            return Err(ConfigError::EmptyList("--source-files").into());
        }
        let style_file = opts
            .style_file
            .as_deref()
            .map(absolute)
            .transpose()
            .context("resolving --style-file")?;
        Ok(Self {
            bin_dir: absolute(&opts.bin_dir)?,
            include_dirs: split_list(&opts.include_dirs),
            source_files,
            std: opts.std.clone(),
            mapping_file: opts.mapping_file.clone(),
            style_file,
            python: opts.python.clone(),
            fix_includes: opts.fix_includes.clone(),
        })
    }
}

/// Configuration of the `bootstrap` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Requirements document.
    pub requirements: PathBuf,
    /// Directory relative paths in the document resolve against.
    pub root: PathBuf,
    /// Check [`BASELINE_TOOLS`] before the document's tools.
    pub baseline_tools: bool,
}

impl BootstrapConfig {
    /// Build the configuration from command-line options.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be made absolute.
    pub fn from_opts(opts: &BootstrapOpts) -> Result<Self> {
        let root = opts
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            requirements: absolute(&opts.file)?,
            root: absolute(&root)?,
            baseline_tools: opts.baseline_tools,
        })
    }

    /// Tools to check: the baseline (when enabled) then `listed`.
    #[must_use]
    pub fn tools(&self, listed: &[ToolRequirement]) -> Vec<ToolRequirement> {
        let baseline = BASELINE_TOOLS
            .iter()
            .filter(|_| self.baseline_tools)
            .map(|exe| ToolRequirement::any_version(exe));
        baseline.chain(listed.iter().cloned()).collect()
    }
}

/// Build a [`CopySpec`] from the `copy` command options.
///
/// # Errors
///
/// Returns an error if the extension list is empty or a path cannot be made
/// absolute.
pub fn copy_spec_from_opts(opts: &CopyOpts) -> Result<CopySpec> {
    let out_dir = absolute(&opts.out_dir)?;
    let spec = match (&opts.file, &opts.ext) {
        (Some(file), _) => CopySpec::file(absolute(file)?, out_dir),
        (None, Some(ext)) => {
            CopySpec::extensions(absolute(&opts.src_dir)?, parse_extensions(ext)?, out_dir)
        }
        (None, None) => return Err(ConfigError::EmptyList("--file or --ext").into()),
    };
    Ok(spec
        .recursive(opts.recursive)
        .keep_paths(opts.keep_paths)
        .flatten(opts.flatten)
        .overwrite(opts.overwrite)
        .clear(opts.clear))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::copy::CopySource;
    use clap::Parser as _;

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["ptools"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv).command
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" app, ,lib,"), ["app", "lib"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn post_build_tasks_keep_order() {
        let Command::PostBuild(opts) = parse(&["post-build", "-o", "out", "-b", "bin", "-p", "b,a", "-t", "t"])
        else {
            return;
        };
        let config = PostBuildConfig::from_opts(&opts).unwrap();
        assert!(config.out_dir.is_absolute());
        assert!(config.coverage.is_none());
        let tasks = config.tasks();
        let summary: Vec<_> = tasks.iter().map(|t| (t.name.as_str(), t.is_test)).collect();
        assert_eq!(summary, [("b", false), ("a", false), ("t", true)]);
    }

    #[test]
    fn post_build_coverage_settings() {
        let Command::PostBuild(opts) = parse(&["post-build", "-o", "o", "-b", "b", "-c", "--coverage-jobs", "4"])
        else {
            return;
        };
        let coverage = PostBuildConfig::from_opts(&opts).unwrap().coverage.unwrap();
        assert_eq!(coverage.jobs, 4);
        assert_eq!(coverage.tool, CoverageConfig::default().tool);
        assert_eq!(coverage.exclude, CoverageConfig::default().exclude);
    }

    #[test]
    fn pre_build_requires_sources() {
        let Command::PreBuild(opts) = parse(&["pre-build", "-b", "bin", "-s", " , ", "--std", "c++20"])
        else {
            return;
        };
        let err = PreBuildConfig::from_opts(&opts).unwrap_err();
        assert!(err.to_string().contains("--source-files"));
    }

    #[test]
    fn pre_build_resolves_style_file() {
        let Command::PreBuild(opts) = parse(&[
            "pre-build", "-b", "bin", "-s", "a.cpp, b.cpp", "--std", "c++20", "--style-file", ".clang-format",
        ]) else {
            return;
        };
        let config = PreBuildConfig::from_opts(&opts).unwrap();
        assert_eq!(config.source_files, [PathBuf::from("a.cpp"), PathBuf::from("b.cpp")]);
        assert!(config.style_file.unwrap().is_absolute());
    }

    #[test]
    fn bootstrap_tools_include_baseline() {
        let config = BootstrapConfig {
            requirements: PathBuf::from("/r.json"),
            root: PathBuf::from("/"),
            baseline_tools: true,
        };
        let listed = [ToolRequirement {
            executable: "clang".to_string(),
            version_string: Some("17".to_string()),
        }];
        let names: Vec<_> = config
            .tools(&listed)
            .into_iter()
            .map(|t| t.executable)
            .collect();
        assert_eq!(names, ["git", "cmake", "gcovr", "ninja", "tar", "clang"]);

        let config = BootstrapConfig {
            baseline_tools: false,
            ..config
        };
        assert_eq!(config.tools(&listed).len(), 1);
    }

    #[test]
    fn copy_spec_from_extension_options() {
        let Command::Copy(opts) = parse(&["copy", "-o", "out", "-s", "src", "-e", "exe,.dll", "-r"])
        else {
            return;
        };
        let spec = copy_spec_from_opts(&opts).unwrap();
        assert!(spec.recursive);
        assert!(matches!(
            &spec.source,
            CopySource::Extensions { extensions, .. } if extensions == &["exe", "dll"]
        ));
    }

    #[test]
    fn copy_spec_from_file_option() {
        let Command::Copy(opts) = parse(&["copy", "-o", "out", "-f", "tool.exe", "--overwrite"]) else {
            return;
        };
        let spec = copy_spec_from_opts(&opts).unwrap();
        assert!(spec.overwrite);
        assert!(matches!(&spec.source, CopySource::File(p) if p.ends_with("tool.exe")));
    }
}
