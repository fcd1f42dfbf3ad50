//! Shell hook execution.
//!
//! Hooks are ordered lists of shell scripts run around a reconciliation.
//! Each script runs under `sh -c` with inherited stdio and environment; a
//! failing script halts the list and propagates its error. In dry-run mode
//! scripts are logged, never executed.

use std::process::Command;

use anyhow::{Context as _, Result, bail};

/// Runs pre/post-apply hook scripts.
#[derive(Debug, Clone, Copy)]
pub struct HookRunner {
    dry_run: bool,
}

impl HookRunner {
    #[must_use]
    pub const fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Execute an ordered list of scripts, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failing script's error, tagged with the hook kind and
    /// its index in the list.
    pub fn run_hooks(&self, scripts: &[String], hook_kind: &str) -> Result<()> {
        if scripts.is_empty() {
            return Ok(());
        }

        tracing::info!("Executing {hook_kind} hooks ({} scripts)", scripts.len());

        for (index, script) in scripts.iter().enumerate() {
            self.run_script(script, &format!("{hook_kind}[{index}]"))
                .with_context(|| format!("execute {hook_kind} hook {index}"))?;
        }

        tracing::info!("Successfully executed all {hook_kind} hooks");
        Ok(())
    }

    fn run_script(&self, script: &str, identifier: &str) -> Result<()> {
        let script = script.trim();
        if script.is_empty() {
            tracing::debug!("Skipping empty hook {identifier}");
            return Ok(());
        }

        if self.dry_run {
            tracing::info!("DRY RUN: Would execute hook {identifier}:\n{script}");
            return Ok(());
        }
        tracing::debug!("Executing hook {identifier}:\n{script}");

        // Inherit stdio and environment so hooks behave like an interactive
        // shell line.
        let status = Command::new("sh")
            .arg("-c")
            .arg(script)
            .status()
            .with_context(|| format!("spawn shell for hook {identifier}"))?;

        if !status.success() {
            bail!(
                "hook {identifier} exited with {}",
                status.code().map_or_else(
                    || "signal".to_string(),
                    |code| format!("status {code}")
                )
            );
        }

        tracing::debug!("Successfully executed hook {identifier}");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_a_noop() {
        HookRunner::new(false)
            .run_hooks(&[], "pre_apply")
            .expect("no scripts, no failure");
    }

    #[test]
    fn successful_script_runs() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = format!("touch {}", marker.display());
        HookRunner::new(false)
            .run_hooks(&[script], "pre_apply")
            .unwrap();
        assert!(marker.exists(), "hook should have executed");
    }

    #[test]
    fn failing_script_halts_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("after");
        let scripts = vec!["false".to_string(), format!("touch {}", marker.display())];

        let err = HookRunner::new(false)
            .run_hooks(&scripts, "post_apply")
            .expect_err("false must fail the run");
        assert!(err.to_string().contains("post_apply"), "{err}");
        assert!(
            !marker.exists(),
            "scripts after the failure must not execute"
        );
    }

    #[test]
    fn dry_run_never_executes() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = format!("touch {}", marker.display());
        HookRunner::new(true)
            .run_hooks(&[script], "pre_apply")
            .unwrap();
        assert!(!marker.exists(), "dry-run must not touch the system");
    }

    #[test]
    fn blank_scripts_are_skipped() {
        HookRunner::new(false)
            .run_hooks(&["   \n".to_string()], "pre_apply")
            .expect("whitespace-only script is skipped, not run");
    }
}
