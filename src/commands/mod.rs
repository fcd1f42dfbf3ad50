//! Top-level subcommand orchestration.

pub mod apply;
pub mod generate;
pub mod list;
pub mod status;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::{ConfigLoader, SystemConfig, Target, TargetConfig};
use crate::executors::ExecutorRegistry;
use crate::hooks::HookRunner;

/// Shared initialization for the apply and status commands.
pub(crate) struct CommandContext {
    pub system_config: SystemConfig,
    pub targets: Vec<Target>,
    pub registry: ExecutorRegistry,
    pub hook_runner: HookRunner,
    pub dry_run: bool,
}

/// Load configuration, select targets, and wire up the executor registry.
///
/// `dry_run_override` forces the mode regardless of the global flag
/// (status always runs dry); `force_backup` turns backups on for every
/// selected file target (the `apply --backup` contract).
pub(crate) fn initialize(
    global: &GlobalOpts,
    target_names: &[String],
    dry_run_override: Option<bool>,
    force_backup: bool,
) -> Result<CommandContext> {
    let dry_run = dry_run_override.unwrap_or(global.dry_run);

    let system_config = ConfigLoader::new(&global.config).load()?;
    let mut targets = system_config.select_targets(target_names)?;

    if force_backup {
        for target in &mut targets {
            if let TargetConfig::File(config) = &mut target.config {
                config.backup = true;
            }
        }
    }

    Ok(CommandContext {
        system_config,
        targets,
        registry: ExecutorRegistry::new(),
        hook_runner: HookRunner::new(dry_run),
        dry_run,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::path::Path;

    fn global_for(path: &Path) -> GlobalOpts {
        GlobalOpts {
            config: path.to_path_buf(),
            dry_run: false,
        }
    }

    fn write_basic_config(dir: &Path) {
        std::fs::write(
            dir.join("main.toml"),
            "[[targets]]\nname = \"app\"\ntype = \"file\"\n[targets.config]\npath = \"/tmp/app\"\n",
        )
        .expect("write config");
    }

    #[test]
    fn initialize_selects_all_targets() {
        let dir = tempfile::tempdir().unwrap();
        write_basic_config(dir.path());
        let ctx = initialize(&global_for(dir.path()), &[], None, false).unwrap();
        assert_eq!(ctx.targets.len(), 1);
        assert!(!ctx.dry_run);
    }

    #[test]
    fn dry_run_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_basic_config(dir.path());
        let ctx = initialize(&global_for(dir.path()), &[], Some(true), false).unwrap();
        assert!(ctx.dry_run, "override must win over the global flag");
    }

    #[test]
    fn force_backup_flips_file_targets() {
        let dir = tempfile::tempdir().unwrap();
        write_basic_config(dir.path());
        let ctx = initialize(&global_for(dir.path()), &[], None, true).unwrap();
        let TargetConfig::File(config) = &ctx.targets[0].config else {
            panic!("expected file target");
        };
        assert!(config.backup);
    }

    #[test]
    fn unknown_target_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_basic_config(dir.path());
        assert!(initialize(&global_for(dir.path()), &["nope".to_string()], None, false).is_err());
    }
}
