//! External process execution.
//!
//! Every subprocess in the tool goes through the [`Executor`] trait so that
//! tasks and pipelines can be unit-tested with a scripted executor.  Calls
//! block until the child exits; there is no timeout.
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Captured standard output (empty when redirected to a file).
    pub stdout: String,
    /// Captured standard error (empty when redirected to a file).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Destination files for a command whose output is kept on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFiles {
    /// File receiving standard output.
    pub stdout: PathBuf,
    /// File receiving standard error.
    pub stderr: PathBuf,
    /// Write a `COMMAND: ...` line to the stdout file before running.
    pub header: bool,
}

impl LogFiles {
    /// Log files `<dir>/<stem>_out.txt` and `<dir>/<stem>_err.txt`.
    #[must_use]
    pub fn in_dir(dir: &Path, stem: &str) -> Self {
        Self {
            stdout: dir.join(format!("{stem}_out.txt")),
            stderr: dir.join(format!("{stem}_err.txt")),
            header: false,
        }
    }

    /// Enable the command header line.
    #[must_use]
    pub const fn with_header(mut self) -> Self {
        self.header = true;
        self
    }
}

/// Abstraction over process execution.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command in a specific directory. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing failure (returns result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with stdout/stderr redirected to `logs`, allowing failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the log files cannot be created or the process
    /// cannot be spawned.
    fn run_logged(&self, program: &str, args: &[&str], logs: &LogFiles) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

/// Execute a command and return the result, bailing on non-zero exit.
fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute: {label}"))?;
    let result = ExecResult::from(output);
    if !result.success {
        bail!(
            "{label} failed (exit {}): {}",
            result.code.unwrap_or(-1),
            result.stderr.trim()
        );
    }
    Ok(result)
}

/// Create `path` (and its parent directories), truncating any previous content.
fn create_log(path: &Path) -> Result<File> {
    crate::fs::ensure_parent_dir(path)?;
    File::create(path).with_context(|| format!("creating log file {}", path.display()))
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        execute_checked(cmd, program)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        execute_checked(cmd, &format!("{program} in {}", dir.display()))
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;

        Ok(ExecResult::from(output))
    }

    fn run_logged(&self, program: &str, args: &[&str], logs: &LogFiles) -> Result<ExecResult> {
        let mut out = create_log(&logs.stdout)?;
        if logs.header {
            writeln!(out, "COMMAND: {}", render_command(program, args))
                .with_context(|| format!("writing {}", logs.stdout.display()))?;
            out.flush()
                .with_context(|| format!("writing {}", logs.stdout.display()))?;
        }
        let err = create_log(&logs.stderr)?;

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err))
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;

        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: status.success(),
            code: status.code(),
        })
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Render a command line for logs, quoting arguments that contain spaces.
#[must_use]
pub fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(|part| {
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("\"{part}\"")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert a path into a command argument.
#[must_use]
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: run a simple echo command cross-platform.
    fn echo_result(msg: &str) -> Result<ExecResult> {
        #[cfg(windows)]
        {
            SystemExecutor.run("cmd", &["/C", "echo", msg])
        }
        #[cfg(not(windows))]
        {
            SystemExecutor.run("echo", &[msg])
        }
    }

    #[test]
    fn run_echo() {
        let result = echo_result("hello").unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn run_failure() {
        #[cfg(windows)]
        let result = SystemExecutor.run("cmd", &["/C", "exit", "1"]);
        #[cfg(not(windows))]
        let result = SystemExecutor.run("false", &[]);
        assert!(result.is_err(), "non-zero exit should produce an error");
    }

    #[test]
    fn run_unchecked_failure() {
        #[cfg(windows)]
        let result = SystemExecutor.run_unchecked("cmd", &["/C", "exit", "1"]).unwrap();
        #[cfg(not(windows))]
        let result = SystemExecutor.run_unchecked("false", &[]).unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
    }

    #[test]
    fn run_unchecked_missing_program_is_error() {
        let result = SystemExecutor.run_unchecked("this-program-does-not-exist-12345", &[]);
        assert!(result.is_err(), "spawn failure should be an error");
    }

    #[test]
    fn which_missing_program() {
        assert!(
            !SystemExecutor.which("this-program-does-not-exist-12345"),
            "non-existent program should not be found"
        );
    }

    #[test]
    fn run_in_tempdir() {
        let dir = std::env::temp_dir();
        #[cfg(windows)]
        let result = SystemExecutor.run_in(&dir, "cmd", &["/C", "echo", "hello"]).unwrap();
        #[cfg(not(windows))]
        let result = SystemExecutor.run_in(&dir, "echo", &["hello"]).unwrap();
        assert!(result.success, "echo in temp dir should succeed");
    }

    #[cfg(unix)]
    #[test]
    fn run_logged_writes_header_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let logs = LogFiles::in_dir(&dir.path().join("logs"), "echo").with_header();
        let result = SystemExecutor.run_logged("echo", &["hi there"], &logs).unwrap();
        assert!(result.success);
        assert!(result.stdout.is_empty(), "output goes to the file");

        let out = std::fs::read_to_string(&logs.stdout).unwrap();
        assert_eq!(out, "COMMAND: echo \"hi there\"\nhi there\n");
        assert!(logs.stderr.exists());
    }

    #[cfg(unix)]
    #[test]
    fn run_logged_reports_failure_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let logs = LogFiles::in_dir(dir.path(), "false");
        let result = SystemExecutor.run_logged("false", &[], &logs).unwrap();
        assert!(!result.success);
        assert_eq!(result.code, Some(1));
    }

    #[test]
    fn log_files_in_dir_naming() {
        let logs = LogFiles::in_dir(Path::new("/bin/app"), "app_gcovr");
        assert_eq!(logs.stdout, PathBuf::from("/bin/app/app_gcovr_out.txt"));
        assert_eq!(logs.stderr, PathBuf::from("/bin/app/app_gcovr_err.txt"));
        assert!(!logs.header);
    }

    #[test]
    fn render_command_quotes_spaces() {
        insta::assert_snapshot!(
            render_command("clang-format", &["-style=file:/a b/.clang-format", "-i", "x.cpp"]),
            @r#"clang-format "-style=file:/a b/.clang-format" -i x.cpp"#
        );
    }
}
