//! Phase: reset the listed directories.
use anyhow::Result;

use super::{Context, Task, TaskStats, process_resources};
use crate::resources::directory::DirectoryResource;

/// Empty (or create) each directory listed under `reset`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResetDirectories;

impl Task for ResetDirectories {
    fn name(&self) -> &str {
        "Reset directories"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.requirements.reset.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskStats> {
        let resources = ctx
            .requirements
            .reset
            .iter()
            .map(|entry| DirectoryResource::new(ctx.resolve(&entry.folder)));
        process_resources(ctx, resources, "reset")
    }
}
