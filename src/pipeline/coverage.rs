//! Coverage sub-pipeline: run a test executable, gather the gcov metadata it
//! produced and render an HTML report.
//!
//! Nothing here is fatal once the executable exists: a failing test run or
//! report generator means "could not measure", which is logged and reported
//! through [`ProjectOutcome`].
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::ProjectOutcome;
use crate::config::CoverageConfig;
use crate::copy::{CopySpec, copy};
use crate::exec::{Executor, LogFiles, path_arg};
use crate::logging::Log;

/// Extensions of gcov instrumentation metadata.
pub const METADATA_EXTENSIONS: &[&str] = &["gcno", "gcda"];

/// Directory under the project build folder receiving the metadata.
pub const METADATA_DIR: &str = "coverage_metadata";

/// Directory under the output directory receiving the report.
pub const REPORT_DIR: &str = "coverage_report";

/// Main page of the HTML report.
pub const REPORT_FILE: &str = "coverage_report.html";

/// Runs one test project and renders its coverage report.
pub struct Coverage<'a> {
    config: &'a CoverageConfig,
    out_dir: &'a Path,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
}

impl std::fmt::Debug for Coverage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coverage")
            .field("config", &self.config)
            .field("out_dir", &self.out_dir)
            .field("executor", &self.executor)
            .field("log", &"<dyn Log>")
            .finish()
    }
}

impl<'a> Coverage<'a> {
    /// Create a coverage runner writing its report under `out_dir`.
    #[must_use]
    pub const fn new(
        config: &'a CoverageConfig,
        out_dir: &'a Path,
        executor: &'a dyn Executor,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            config,
            out_dir,
            executor,
            log,
        }
    }

    /// Path of the HTML report.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join(REPORT_DIR).join(REPORT_FILE)
    }

    /// Measure project `name` built in `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be copied or the report
    /// directory cannot be created.
    pub fn measure(&self, project_dir: &Path, name: &str) -> Result<ProjectOutcome> {
        let executable = project_dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
        if !executable.is_file() {
            self.log.warn(&format!(
                "test executable {} not found, skipping coverage",
                executable.display()
            ));
            return Ok(ProjectOutcome::NoExecutable);
        }

        self.run_tests(&executable, project_dir, name);
        let metadata = self.collect_metadata(project_dir, name)?;
        self.generate_report(&metadata, project_dir, name)
    }

    fn run_tests(&self, executable: &Path, project_dir: &Path, name: &str) {
        self.log.info(&format!("running {}", executable.display()));
        let logs = LogFiles::in_dir(project_dir, name);
        match self.executor.run_logged(&path_arg(executable), &[], &logs) {
            Ok(result) if result.success => {}
            Ok(result) => self.log.warn(&format!(
                "{name} exited with code {}, output in {}",
                result.code.unwrap_or(-1),
                logs.stdout.display()
            )),
            Err(e) => self.log.warn(&format!("could not run {name}: {e:#}")),
        }
    }

    /// Copy the metadata into a freshly emptied `coverage_metadata` folder.
    fn collect_metadata(&self, project_dir: &Path, name: &str) -> Result<PathBuf> {
        let metadata = project_dir.join(METADATA_DIR);
        crate::fs::reset_dir(&metadata)?;

        let object_dir = project_dir.join("CMakeFiles").join(format!("{name}.dir"));
        let sources = [
            (object_dir.clone(), false),
            (object_dir.join("__").join("src"), true),
        ];
        let extensions: Vec<String> = METADATA_EXTENSIONS.iter().map(|e| (*e).to_string()).collect();

        for (source, recursive) in sources {
            if !source.is_dir() {
                self.log.warn(&format!(
                    "coverage metadata directory {} not found",
                    source.display()
                ));
                continue;
            }
            let spec = CopySpec::extensions(source, extensions.clone(), &metadata)
                .recursive(recursive)
                .keep_paths(true);
            copy(&spec, self.log)?;
        }
        Ok(metadata)
    }

    fn generate_report(&self, metadata: &Path, project_dir: &Path, name: &str) -> Result<ProjectOutcome> {
        let report = self.report_path();
        crate::fs::ensure_parent_dir(&report)?;

        let root = path_arg(&self.config.root);
        let output = path_arg(&report);
        let object_dir = path_arg(metadata);
        let jobs = self.config.jobs.to_string();
        let mut args: Vec<&str> = vec![
            "--root",
            &root,
            "--html",
            "--html-details",
            "--output",
            &output,
            "--object-directory",
            &object_dir,
        ];
        for dir in &self.config.exclude {
            args.extend(["--exclude-directories", dir.as_str()]);
        }
        args.extend(["-j", &jobs, "--verbose"]);

        let logs = LogFiles::in_dir(project_dir, &format!("{name}_gcovr"));
        self.log.info(&format!("generating coverage report for {name}"));
        let result = self
            .executor
            .run_logged(&self.config.tool, &args, &logs)
            .with_context(|| format!("running {}", self.config.tool));

        match result {
            Ok(r) if r.success => {
                self.log
                    .info(&format!("coverage report available at {}", report.display()));
                Ok(ProjectOutcome::Measured { report })
            }
            Ok(r) => {
                self.log.error(&format!(
                    "{} failed (exit {}), error log available at {}",
                    self.config.tool,
                    r.code.unwrap_or(-1),
                    logs.stderr.display()
                ));
                Ok(ProjectOutcome::ReportFailed { log: logs.stderr })
            }
            Err(e) => {
                self.log.error(&format!(
                    "{e:#}, error log available at {}",
                    logs.stderr.display()
                ));
                Ok(ProjectOutcome::ReportFailed { log: logs.stderr })
            }
        }
    }
}
