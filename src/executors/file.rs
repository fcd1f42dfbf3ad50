//! Executor for structured-file targets.

use std::path::Path;

use anyhow::{Context as _, Result, bail};

use super::Executor;
use crate::backup::create_backup;
use crate::config::{FileConfig, Map, Target, TargetConfig, deep_merge};
use crate::exec::CommandRunner;
use crate::formats::FormatRegistry;
use crate::state::Diff;

/// Converges files on disk through the format codecs. Unmanaged keys in
/// the live file are preserved: desired content is merged *into* the
/// current state before serialization, and for INI the codec applies the
/// merge as line-level edits.
pub struct FileExecutor<R> {
    formats: FormatRegistry,
    runner: R,
}

impl<R: CommandRunner> FileExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self {
            formats: FormatRegistry::new(),
            runner,
        }
    }

    fn config<'a>(target: &'a Target) -> Result<&'a FileConfig> {
        match &target.config {
            TargetConfig::File(config) => Ok(config),
            _ => bail!("expected file target, got {}", target.kind()),
        }
    }

    /// Set owner/group via `chown` and mode from the octal string.
    fn apply_permissions(&self, config: &FileConfig) -> Result<()> {
        if config.owner.is_some() || config.group.is_some() {
            let spec = match (&config.owner, &config.group) {
                (Some(owner), Some(group)) => format!("{owner}:{group}"),
                (Some(owner), None) => owner.clone(),
                (None, Some(group)) => format!(":{group}"),
                (None, None) => unreachable!(),
            };
            self.runner
                .run("chown", &[&spec, &config.path])
                .with_context(|| format!("set ownership of {}", config.path))?;
        }

        if let Some(mode) = &config.mode {
            let mode = u32::from_str_radix(mode, 8)
                .with_context(|| format!("invalid file mode {mode}"))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt as _;
                std::fs::set_permissions(&config.path, std::fs::Permissions::from_mode(mode))
                    .with_context(|| format!("set permissions of {}", config.path))?;
            }
        }

        Ok(())
    }
}

impl<R: CommandRunner> Executor for FileExecutor<R> {
    fn validate(&self, target: &Target) -> Result<()> {
        let config = Self::config(target)?;
        config.validate()?;
        if !self.formats.has(&config.format) {
            bail!("unsupported file format: {}", config.format);
        }
        Ok(())
    }

    fn current_state(&self, target: &Target) -> Result<Map> {
        let config = Self::config(target)?;

        let path = Path::new(&config.path);
        if !path.exists() {
            return Ok(Map::new());
        }

        let mut codec = self.formats.get(&config.format)?;
        codec.configure(&config.options)?;

        let data = std::fs::read(path).with_context(|| format!("read file {}", config.path))?;
        codec.unmarshal(&data)
    }

    fn apply(&self, target: &Target, diff: &Diff) -> Result<()> {
        if diff.is_empty() {
            tracing::debug!("No changes needed for file: {}", Self::config(target)?.path);
            return Ok(());
        }

        let config = Self::config(target)?;
        tracing::debug!("Applying changes to file: {}", config.path);

        let mut codec = self.formats.get(&config.format)?;
        codec.configure(&config.options)?;

        if config.backup {
            let _ = create_backup(Path::new(&config.path)).context("create backup")?;
        }

        let path = Path::new(&config.path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }

        // Read the current file through this codec instance so the INI
        // line cache survives into the marshal below.
        let mut current = if path.exists() {
            let data =
                std::fs::read(path).with_context(|| format!("read file {}", config.path))?;
            codec.unmarshal(&data).context("parse current state")?
        } else {
            Map::new()
        };

        // Merge desired content into the current state: unmanaged keys stay.
        deep_merge(&mut current, config.content.clone());

        let mut buf = Vec::new();
        codec.marshal(&current, &mut buf).context("marshal content")?;
        std::fs::write(path, &buf).with_context(|| format!("write file {}", config.path))?;

        self.apply_permissions(config)?;

        tracing::debug!("Successfully updated file: {}", config.path);
        Ok(())
    }
}
