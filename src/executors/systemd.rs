//! Executor for systemd unit targets.
//!
//! Unit-file mutation is deliberately not persisted: `apply` reports the
//! drift and fails when property changes are pending. Reading state and
//! the reload path work; converging unit files is a TODO tracked against
//! editing them through the INI engine (units are INI-like).

use anyhow::{Result, bail};

use super::Executor;
use crate::config::{Map, SystemdConfig, Target, TargetConfig, Value};
use crate::exec::CommandRunner;
use crate::state::Diff;

/// Drives `systemctl` for unit targets.
pub struct SystemdExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> SystemdExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn config<'a>(target: &'a Target) -> Result<&'a SystemdConfig> {
        match &target.config {
            TargetConfig::Systemd(config) => Ok(config),
            _ => bail!("expected systemd target, got {}", target.kind()),
        }
    }

    fn update_unit_file(_unit: &str, _properties: &Map) -> Result<()> {
        bail!("unit file update not implemented")
    }
}

impl<R: CommandRunner> Executor for SystemdExecutor<R> {
    fn validate(&self, target: &Target) -> Result<()> {
        Self::config(target)?.validate()?;
        Ok(())
    }

    fn current_state(&self, target: &Target) -> Result<Map> {
        let config = Self::config(target)?;
        if config.unit.is_empty() {
            bail!("systemd unit not specified");
        }

        let Ok(result) = self.runner.run_unchecked("systemctl", &["show", &config.unit]) else {
            return Ok(Map::new());
        };
        if !result.success() {
            return Ok(Map::new());
        }

        let mut state = Map::new();
        state.insert("_status".to_string(), Value::String(result.stdout));
        Ok(state)
    }

    fn apply(&self, target: &Target, diff: &Diff) -> Result<()> {
        if diff.is_empty() {
            return Ok(());
        }

        let config = Self::config(target)?;
        if config.unit.is_empty() {
            bail!("systemd unit not specified");
        }

        if !diff.changes.is_empty() {
            Self::update_unit_file(&config.unit, &config.properties)?;

            self.runner
                .run("systemctl", &["daemon-reload"])
                .map_err(|err| anyhow::anyhow!("reload systemd: {err}"))?;
        }

        if config.reload {
            self.runner
                .run("systemctl", &["reload-or-restart", &config.unit])?;
        }

        Ok(())
    }
}
