//! Phase: fetch and unpack downloadable resources.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskStats, process_resources};
use crate::resources::download::DownloadResource;

/// Download, verify and unpack every archive listed under `wget` into
/// `wget_dir/<name>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchResources;

impl Task for FetchResources {
    fn name(&self) -> &str {
        "Fetch resources"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.requirements.wget.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskStats> {
        let wget_root = ctx
            .requirements
            .wget_root(ctx.root())
            .context("wget_dir is not set")?;
        let resources = ctx.requirements.wget.iter().map(|entry| {
            DownloadResource::new(
                entry.clone(),
                wget_root.join(&entry.name),
                ctx.executor.as_ref(),
                ctx.downloader.as_ref(),
            )
        });
        process_resources(ctx, resources, "fetch")
    }
}
