//! Phase: clone git repositories.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskStats, process_resources};
use crate::resources::git_repo::GitRepoResource;

/// Clone every repository listed under `git` into `git_dir/<name>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchGitRepositories;

impl Task for FetchGitRepositories {
    fn name(&self) -> &str {
        "Fetch git repositories"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.requirements.git.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskStats> {
        let git_root = ctx
            .requirements
            .git_root(ctx.root())
            .context("git_dir is not set")?;
        let resources = ctx.requirements.git.iter().map(|entry| {
            GitRepoResource::new(
                entry.clone(),
                git_root.join(&entry.name),
                ctx.executor.as_ref(),
            )
        });
        process_resources(ctx, resources, "clone")
    }
}
