//! Phase: check required tools and their versions.
use anyhow::Result;

use super::{Context, Task, TaskStats};
use crate::resources::tool::ToolResource;

/// Check that every required tool answers `--version`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckTools;

impl Task for CheckTools {
    fn name(&self) -> &str {
        "Check tools"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.tools(&ctx.requirements.tools).is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskStats> {
        let mut stats = TaskStats::default();
        for requirement in ctx.config.tools(&ctx.requirements.tools) {
            let resource = ToolResource::new(requirement, ctx.executor.as_ref());
            let version = resource.check()?;
            ctx.log
                .info(&format!("{}: {version}", resource.requirement.executable));
            stats.already_ok += 1;
        }
        Ok(stats)
    }
}
