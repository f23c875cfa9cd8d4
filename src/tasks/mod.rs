//! Bootstrap phases, run strictly in order with fail-fast semantics.
//!
//! Later phases assume the earlier ones succeeded (directories are reset
//! before anything is cloned into them), so the first failing phase stops
//! the run.
pub mod context;
pub mod download;
pub mod git;
pub mod removal;
pub mod reset;
pub mod tools;

pub use context::Context;

use anyhow::Result;

use crate::logging::TaskStatus;
use crate::resources::{Applicable, ResourceChange};

/// Counters for tasks that process many items.
///
/// # Examples
///
/// ```
/// use project_tools::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 2, already_ok: 3 };
/// assert_eq!(stats.summary(), "2 changed, 3 already ok");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the desired state.
    pub already_ok: u32,
}

impl TaskStats {
    /// Format the summary string (e.g. "3 changed, 10 already ok").
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} changed, {} already ok", self.changed, self.already_ok)
    }
}

impl std::ops::AddAssign<ResourceChange> for TaskStats {
    fn add_assign(&mut self, change: ResourceChange) {
        match change {
            ResourceChange::Applied => self.changed += 1,
            ResourceChange::AlreadyCorrect => self.already_ok += 1,
        }
    }
}

/// A named bootstrap phase.
pub trait Task {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether the phase has anything to do.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the phase.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any item of the phase.
    fn run(&self, ctx: &Context) -> Result<TaskStats>;
}

/// The bootstrap phases in execution order.
#[must_use]
pub fn all_bootstrap_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(tools::CheckTools),
        Box::new(reset::ResetDirectories),
        Box::new(git::FetchGitRepositories),
        Box::new(download::FetchResources),
        Box::new(removal::RemoveEntries),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// # Errors
///
/// Returns the task error after recording it as failed.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    let phase = crate::logging::scope(task.name());
    let outcome = task.run(ctx);
    drop(phase);

    match outcome {
        Ok(stats) => {
            let summary = stats.summary();
            ctx.log.info(&summary);
            ctx.log
                .record_task(task.name(), TaskStatus::Ok, Some(&summary));
            Ok(())
        }
        Err(e) => {
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e.context(format!("{} failed", task.name())))
        }
    }
}

/// Execute `tasks` in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the error of the first failing task; later tasks are not run.
pub fn run_all(tasks: &[Box<dyn Task>], ctx: &Context) -> Result<()> {
    for task in tasks {
        execute(task.as_ref(), ctx)?;
    }
    Ok(())
}

/// Apply every resource in order, logging each at debug level.
///
/// # Errors
///
/// Returns the first error raised by [`Applicable::apply`].
pub fn process_resources<R, I>(ctx: &Context, resources: I, verb: &str) -> Result<TaskStats>
where
    R: Applicable,
    I: IntoIterator<Item = R>,
{
    let mut stats = TaskStats::default();
    for resource in resources {
        let desc = resource.description();
        ctx.log.debug(&format!("{verb}: {desc}"));
        stats += resource.apply()?;
    }
    Ok(stats)
}
