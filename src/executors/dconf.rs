//! Executor for GNOME dconf targets.

use anyhow::{Result, bail};

use super::Executor;
use crate::config::{DconfConfig, Map, Target, TargetConfig, Value};
use crate::exec::CommandRunner;
use crate::state::Diff;

/// Drives `dconf write` / `dconf dump` for a schema path. When a user is
/// configured it is propagated through `SUDO_USER` so the invocation acts
/// on that user's database.
pub struct DconfExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> DconfExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn config<'a>(target: &'a Target) -> Result<&'a DconfConfig> {
        match &target.config {
            TargetConfig::Dconf(config) => Ok(config),
            _ => bail!("expected dconf target, got {}", target.kind()),
        }
    }

    fn env_for(config: &DconfConfig) -> Vec<(&str, &str)> {
        config
            .user
            .as_deref()
            .map(|user| ("SUDO_USER", user))
            .into_iter()
            .collect()
    }
}

impl<R: CommandRunner> Executor for DconfExecutor<R> {
    fn validate(&self, target: &Target) -> Result<()> {
        Self::config(target)?.validate()?;
        Ok(())
    }

    fn current_state(&self, target: &Target) -> Result<Map> {
        let config = Self::config(target)?;
        if config.schema.is_empty() {
            bail!("dconf schema not specified");
        }

        let env = Self::env_for(config);
        // Unreadable schema (no session bus, fresh user) reads as empty.
        let Ok(output) = self
            .runner
            .run_with_env("dconf", &["dump", &config.schema], &env)
        else {
            return Ok(Map::new());
        };

        let mut state = Map::new();
        state.insert("_raw".to_string(), Value::String(output.stdout));
        Ok(state)
    }

    fn apply(&self, target: &Target, diff: &Diff) -> Result<()> {
        if diff.is_empty() {
            return Ok(());
        }

        let config = Self::config(target)?;
        if config.schema.is_empty() {
            bail!("dconf schema not specified");
        }

        let env = Self::env_for(config);
        for key in diff.changes.keys() {
            let Some(value) = config.settings.get(key) else {
                continue;
            };

            let dconf_path = format!("{}/{key}", config.schema);
            let quoted = format!("'{}'", value.to_display_string());
            self.runner
                .run_with_env("dconf", &["write", &dconf_path, &quoted], &env)
                .map_err(|err| anyhow::anyhow!("set dconf key {key}: {err}"))?;
        }

        Ok(())
    }
}
