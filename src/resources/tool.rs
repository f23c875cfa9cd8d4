//! Tool presence and version check.
use anyhow::Result;

use super::{Applicable, ResourceChange};
use crate::config::requirements::ToolRequirement;
use crate::error::ToolError;
use crate::exec::Executor;

/// A tool that must answer `--version`, optionally with a given version.
#[derive(Debug)]
pub struct ToolResource<'a> {
    /// Executable and optional version substring.
    pub requirement: ToolRequirement,
    /// Executor for running the version query.
    executor: &'a dyn Executor,
}

impl<'a> ToolResource<'a> {
    /// Create a new tool resource.
    #[must_use]
    pub const fn new(requirement: ToolRequirement, executor: &'a dyn Executor) -> Self {
        Self {
            requirement,
            executor,
        }
    }

    /// Run `<executable> --version` and return the first non-empty output line.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Unavailable`] if the tool cannot be run or exits
    /// non-zero, and [`ToolError::VersionMismatch`] if the required version
    /// substring is absent from the output.
    pub fn check(&self) -> Result<String, ToolError> {
        let executable = &self.requirement.executable;
        let result = self
            .executor
            .run_unchecked(executable, &["--version"])
            .map_err(|e| ToolError::Unavailable {
                executable: executable.clone(),
                detail: format!("{e:#}"),
            })?;

        if !result.success {
            let stderr = result.stderr.trim();
            let detail = if stderr.is_empty() {
                format!("--version exited with code {}", result.code.unwrap_or(-1))
            } else {
                stderr.to_string()
            };
            return Err(ToolError::Unavailable {
                executable: executable.clone(),
                detail,
            });
        }

        let output = format!("{}{}", result.stdout, result.stderr);
        let first_line = output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string();

        if let Some(expected) = &self.requirement.version_string
            && !output.contains(expected.as_str())
        {
            return Err(ToolError::VersionMismatch {
                executable: executable.clone(),
                expected: expected.clone(),
                found: first_line,
            });
        }
        Ok(first_line)
    }
}

impl Applicable for ToolResource<'_> {
    fn description(&self) -> String {
        match &self.requirement.version_string {
            Some(version) => format!("{} ({version})", self.requirement.executable),
            None => self.requirement.executable.clone(),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.check()?;
        Ok(ResourceChange::AlreadyCorrect)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    fn requirement(exe: &str, version: Option<&str>) -> ToolRequirement {
        ToolRequirement {
            executable: exe.to_string(),
            version_string: version.map(String::from),
        }
    }

    #[test]
    fn description_includes_version() {
        let executor = MockExecutor::succeeding(0);
        let resource = ToolResource::new(requirement("cmake", Some("3.28")), &executor);
        assert_eq!(resource.description(), "cmake (3.28)");
        let resource = ToolResource::new(requirement("ninja", None), &executor);
        assert_eq!(resource.description(), "ninja");
    }

    #[test]
    fn check_returns_first_line() {
        let executor = MockExecutor::ok("\ncmake version 3.28.1\n\nCMake suite maintained by Kitware\n");
        let resource = ToolResource::new(requirement("cmake", Some("3.28")), &executor);
        assert_eq!(resource.check().unwrap(), "cmake version 3.28.1");
        assert_eq!(executor.calls(), ["cmake --version"]);
    }

    #[test]
    fn check_any_version() {
        let executor = MockExecutor::ok("ninja 1.11.1\n");
        let resource = ToolResource::new(requirement("ninja", None), &executor);
        assert_eq!(resource.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn version_mismatch_is_reported() {
        let executor = MockExecutor::ok("cmake version 3.22.1\n");
        let resource = ToolResource::new(requirement("cmake", Some("3.28")), &executor);
        let err = resource.check().unwrap_err();
        assert!(
            matches!(&err, ToolError::VersionMismatch { found, .. } if found == "cmake version 3.22.1"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn failing_tool_is_unavailable() {
        let executor = MockExecutor::with_responses(vec![(false, "not found".to_string())]);
        let resource = ToolResource::new(requirement("gcovr", None), &executor);
        let err = resource.check().unwrap_err();
        assert!(
            matches!(&err, ToolError::Unavailable { detail, .. } if detail == "not found"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn missing_program_is_unavailable() {
        let executor = crate::exec::SystemExecutor;
        let resource = ToolResource::new(requirement("this-program-does-not-exist-12345", None), &executor);
        assert!(matches!(resource.check(), Err(ToolError::Unavailable { .. })));
    }
}
