//! Per-target-kind executors.
//!
//! An executor is the driver for one target kind: it validates the typed
//! config, reads the live state back from the system in the same shape the
//! desired content uses, and applies a computed diff. Applying an empty
//! diff is always a no-op success, which is what makes reconciliation
//! idempotent.

mod dconf;
mod file;
mod sed;
mod systemd;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::config::{Map, Target, TargetKind};
use crate::exec::SystemRunner;
use crate::state::Diff;

pub use dconf::DconfExecutor;
pub use file::FileExecutor;
pub use sed::SedExecutor;
pub use systemd::SystemdExecutor;

/// The contract every target-kind driver fulfills.
pub trait Executor {
    /// Structural validation of the target's typed config.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    fn validate(&self, target: &Target) -> Result<()>;

    /// Read the live state from the system.
    ///
    /// A missing resource is not an error: executors return an empty map
    /// (or an `exists: false` sentinel) and let the diff engine classify
    /// everything as added.
    ///
    /// # Errors
    ///
    /// Returns an error for genuine environment failures only.
    fn current_state(&self, target: &Target) -> Result<Map>;

    /// Apply `diff` to the live system. An empty diff is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns an error if the system could not be converged.
    fn apply(&self, target: &Target, diff: &Diff) -> Result<()>;
}

/// Maps target kinds to their executors.
pub struct ExecutorRegistry {
    executors: BTreeMap<TargetKind, Box<dyn Executor>>,
}

impl ExecutorRegistry {
    /// A registry with all four executors wired to the real system.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            executors: BTreeMap::new(),
        };
        registry.register(TargetKind::File, Box::new(FileExecutor::new(SystemRunner)));
        registry.register(TargetKind::Dconf, Box::new(DconfExecutor::new(SystemRunner)));
        registry.register(
            TargetKind::Systemd,
            Box::new(SystemdExecutor::new(SystemRunner)),
        );
        registry.register(TargetKind::Sed, Box::new(SedExecutor::new(SystemRunner)));
        registry
    }

    /// Replace or add the executor for a kind.
    pub fn register(&mut self, kind: TargetKind, executor: Box<dyn Executor>) {
        self.executors.insert(kind, executor);
    }

    /// Look up the executor for a target kind.
    ///
    /// # Errors
    ///
    /// Returns an error naming the kind when no executor is registered.
    pub fn executor(&self, kind: TargetKind) -> Result<&dyn Executor> {
        self.executors
            .get(&kind)
            .map(AsRef::as_ref)
            .ok_or_else(|| anyhow::anyhow!("no executor found for target type '{kind}'"))
    }

    /// All registered target kinds.
    #[must_use]
    pub fn kinds(&self) -> Vec<TargetKind> {
        self.executors.keys().copied().collect()
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
