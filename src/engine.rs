//! The reconciliation engine.
//!
//! Targets are processed serially, in configured order. Per target:
//! read current state, compute the managed-key diff against desired
//! state, then apply — or, in dry-run mode, print the formatted diff.
//! Any failure is wrapped with the target name and halts the run; there
//! is no rollback of earlier targets.

use anyhow::{Context as _, Result};

use crate::color::ColorSupport;
use crate::config::Target;
use crate::executors::ExecutorRegistry;
use crate::state::compute_diff_with_current;

/// Reconciles targets to their desired state through the executor registry.
pub struct Engine<'a> {
    registry: &'a ExecutorRegistry,
    dry_run: bool,
}

impl<'a> Engine<'a> {
    #[must_use]
    pub const fn new(registry: &'a ExecutorRegistry, dry_run: bool) -> Self {
        Self { registry, dry_run }
    }

    /// Run structural validation over every target, failing on the first
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, wrapped with the target name.
    pub fn validate(&self, targets: &[Target]) -> Result<()> {
        for target in targets {
            let executor = self.registry.executor(target.kind())?;
            executor
                .validate(target)
                .with_context(|| format!("validation failed for target '{}'", target.name))?;
        }
        tracing::info!("All targets validated successfully");
        Ok(())
    }

    /// Reconcile every target, in order.
    ///
    /// # Errors
    ///
    /// Returns the first failure, wrapped with the target name; remaining
    /// targets are not attempted.
    pub fn reconcile(&self, targets: &[Target]) -> Result<()> {
        tracing::info!("Starting reconciliation process");

        for target in targets {
            self.reconcile_target(target)
                .with_context(|| format!("reconcile target '{}'", target.name))?;
        }

        tracing::info!("Reconciliation completed successfully");
        Ok(())
    }

    fn reconcile_target(&self, target: &Target) -> Result<()> {
        tracing::debug!(
            "Reconciling target: {} (type: {})",
            target.name,
            target.kind()
        );

        let executor = self.registry.executor(target.kind())?;

        let current = executor
            .current_state(target)
            .context("get current system state")?;
        let desired = target.desired_state();
        let diff = compute_diff_with_current(&target.name, &desired, &current);

        if diff.is_empty() {
            tracing::debug!("No changes needed for target '{}'", target.name);
            return Ok(());
        }

        if self.dry_run {
            tracing::info!("DRY RUN: Would apply changes to target '{}'", target.name);
            let formatted = diff.format(&ColorSupport::new());
            if !formatted.is_empty() {
                println!("Would apply:\n{formatted}");
            }
            return Ok(());
        }

        executor.apply(target, &diff).context("apply changes")?;
        tracing::info!("Successfully applied changes to target '{}'", target.name);
        Ok(())
    }
}
