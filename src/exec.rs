//! External command execution.
//!
//! Every shell-out the executors perform (`dconf`, `systemctl`, `sed`,
//! `chown`) goes through the [`CommandRunner`] trait so tests can
//! substitute a fake and assert on the invocations instead of touching the
//! live system.

use anyhow::{Context, Result, bail};
use std::process::{Command, Output};

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Whether the command exited cleanly (status zero).
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        }
    }
}

/// Runs external commands. Implemented by [`SystemRunner`] for the real
/// system and by mocks in tests.
pub trait CommandRunner {
    /// Run a command and return its output. Fails if the command exits
    /// non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with extra environment variables, failing on non-zero
    /// exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run_with_env(&self, program: &str, args: &[&str], env: &[(&str, &str)])
    -> Result<ExecResult>;

    /// Run a command, allowing failure (returns the result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned at all.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;
}

/// The real-system [`CommandRunner`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

fn describe_exit(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

/// Spawn the command, wait for it, and turn a non-clean exit into an
/// error carrying the program name and its trimmed stderr.
fn capture_checked(mut cmd: Command, program: &str) -> Result<ExecResult> {
    let output = cmd.output().with_context(|| format!("spawn {program}"))?;
    let result = ExecResult::from(output);
    if result.success() {
        return Ok(result);
    }
    bail!(
        "{program} exited with {}: {}",
        describe_exit(result.code),
        result.stderr.trim()
    )
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        capture_checked(cmd, program)
    }

    fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        capture_checked(cmd, program)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("spawn {program}"))?;
        Ok(ExecResult::from(output))
    }
}

/// Check if a program is available on PATH.
#[must_use]
pub fn which(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .is_ok_and(|o| o.status.success())
}
