//! Artifact pipeline: collect each project's build outputs into the output
//! directory and, for test projects, measure coverage.
//!
//! A run resets the output directory, then handles build projects followed
//! by test projects.  Any copy error aborts the run; coverage problems only
//! change the project's [`ProjectOutcome`].
pub mod coverage;

use anyhow::{Context as _, Result};
use std::path::PathBuf;

use crate::config::{PostBuildConfig, ProjectTask};
use crate::copy::{CopySpec, copy};
use crate::exec::Executor;
use crate::logging::{Log, TaskStatus};
use coverage::Coverage;

/// Extensions of build outputs collected from every project: executables,
/// shared libraries and debug symbols.  Static and import libraries are
/// build inputs, not artifacts.
pub const ARTIFACT_EXTENSIONS: &[&str] = &["exe", "dll", "pdb", "so", "dylib"];

/// What happened to one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    /// Artifacts were copied; no coverage was requested.
    Copied {
        /// Number of artifacts copied.
        files: usize,
    },
    /// Coverage ran and the report was written.
    Measured {
        /// Main page of the HTML report.
        report: PathBuf,
    },
    /// The test executable was not found.
    NoExecutable,
    /// The report generator failed.
    ReportFailed {
        /// Generator error log.
        log: PathBuf,
    },
}

impl ProjectOutcome {
    fn status(&self) -> (TaskStatus, String) {
        match self {
            Self::Copied { files } => (TaskStatus::Ok, format!("{files} artifact(s)")),
            Self::Measured { report } => (TaskStatus::Ok, format!("report: {}", report.display())),
            Self::NoExecutable => (TaskStatus::Warned, "test executable not found".to_string()),
            Self::ReportFailed { log } => (
                TaskStatus::Warned,
                format!("coverage report failed, see {}", log.display()),
            ),
        }
    }
}

/// Outcome of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    /// Project name.
    pub name: String,
    /// What happened.
    pub outcome: ProjectOutcome,
}

/// Outcome of a whole run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// One entry per processed project.
    pub projects: Vec<ProjectReport>,
}

impl PipelineReport {
    /// Outcome recorded for `name`, if it was processed.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&ProjectOutcome> {
        self.projects
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.outcome)
    }
}

/// Drives the `post-build` steps for every configured project.
pub struct Pipeline<'a> {
    config: &'a PostBuildConfig,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .field("log", &"<dyn Log>")
            .finish()
    }
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline over `config`.
    #[must_use]
    pub const fn new(config: &'a PostBuildConfig, executor: &'a dyn Executor, log: &'a dyn Log) -> Self {
        Self {
            config,
            executor,
            log,
        }
    }

    /// Reset the output directory and process every project.
    ///
    /// Each project is recorded in the logger's task summary.
    ///
    /// # Errors
    ///
    /// Returns the first error; projects after it are not processed.
    pub fn run(&self) -> Result<PipelineReport> {
        let out_dir = &self.config.out_dir;
        self.log.stage("Preparing output directory");
        crate::fs::reset_dir(out_dir)
            .with_context(|| format!("resetting output directory {}", out_dir.display()))?;

        let mut report = PipelineReport::default();
        for task in self.config.tasks() {
            self.log.stage(&format!("Processing {}", task.name));
            let project = crate::logging::scope(&task.name);
            let processed = self.process(&task);
            drop(project);
            match processed {
                Ok(outcome) => {
                    let (status, message) = outcome.status();
                    self.log.record_task(&task.name, status, Some(&message));
                    report.projects.push(ProjectReport {
                        name: task.name,
                        outcome,
                    });
                }
                Err(e) => {
                    self.log
                        .record_task(&task.name, TaskStatus::Failed, Some(&format!("{e:#}")));
                    return Err(e.context(format!("processing project {}", task.name)));
                }
            }
        }
        Ok(report)
    }

    /// Copy the artifacts of one project and, for a test project with
    /// coverage enabled, measure it.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifacts or coverage metadata cannot be
    /// copied.
    pub fn process(&self, task: &ProjectTask) -> Result<ProjectOutcome> {
        let project_dir = self.config.bin_dir.join(&task.name);
        let extensions = ARTIFACT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect();
        let spec = CopySpec::extensions(&project_dir, extensions, &self.config.out_dir);

        self.log.info("copying artifacts");
        let copied = copy(&spec, self.log)?;

        match &self.config.coverage {
            Some(settings) if task.is_test => {
                Coverage::new(settings, &self.config.out_dir, self.executor, self.log)
                    .measure(&project_dir, &task.name)
            }
            _ => Ok(ProjectOutcome::Copied {
                files: copied.len(),
            }),
        }
    }
}
