//! Phase: delete the entries listed under `delete`.
use anyhow::Result;

use super::{Context, Task, TaskStats, process_resources};
use crate::resources::removal::RemovalResource;

/// Remove every path matching the `delete` patterns.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveEntries;

impl Task for RemoveEntries {
    fn name(&self) -> &str {
        "Remove entries"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.requirements.delete.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskStats> {
        let resources = ctx
            .requirements
            .delete
            .iter()
            .map(|pattern| RemovalResource::new(pattern.clone(), ctx.root().to_path_buf()));
        process_resources(ctx, resources, "remove")
    }
}
