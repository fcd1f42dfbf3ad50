//! Executor for stream-editor targets.

use std::path::Path;

use anyhow::{Context as _, Result, bail};

use super::Executor;
use crate::backup::create_backup;
use crate::config::{Map, SedConfig, Target, TargetConfig, Value};
use crate::exec::CommandRunner;
use crate::state::Diff;

/// Streams a file through `sed`, writing the transformed content back.
/// The target's commands are joined with newlines into a single script.
pub struct SedExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> SedExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn config<'a>(target: &'a Target) -> Result<&'a SedConfig> {
        match &target.config {
            TargetConfig::Sed(config) => Ok(config),
            _ => bail!("expected sed target, got {}", target.kind()),
        }
    }
}

impl<R: CommandRunner> Executor for SedExecutor<R> {
    fn validate(&self, target: &Target) -> Result<()> {
        Self::config(target)?.validate()?;
        Ok(())
    }

    fn current_state(&self, target: &Target) -> Result<Map> {
        let config = Self::config(target)?;
        if config.path.is_empty() {
            bail!("sed target path is required");
        }

        let mut state = Map::new();
        match std::fs::read_to_string(&config.path) {
            Ok(content) => {
                state.insert("content".to_string(), Value::String(content));
                state.insert("exists".to_string(), Value::Bool(true));
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                state.insert("content".to_string(), Value::String(String::new()));
                state.insert("exists".to_string(), Value::Bool(false));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read file {}", config.path));
            }
        }
        Ok(state)
    }

    fn apply(&self, target: &Target, diff: &Diff) -> Result<()> {
        if diff.is_empty() {
            return Ok(());
        }

        let config = Self::config(target)?;
        if config.path.is_empty() {
            bail!("sed target path is required");
        }
        if config.commands.is_empty() {
            bail!("sed commands are required");
        }

        if config.backup {
            let _ = create_backup(Path::new(&config.path)).context("create backup")?;
        }

        let script = config.commands.join("\n");
        let result = self
            .runner
            .run("sed", &[&script, &config.path])
            .with_context(|| format!("run sed commands on {}", config.path))?;

        std::fs::write(&config.path, result.stdout.as_bytes())
            .with_context(|| format!("write processed content to {}", config.path))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::SystemRunner;
    use crate::exec::test_helpers::MockRunner;
    use crate::state::compute_diff_with_current;

    fn sed_target(path: &Path, commands: &[&str]) -> Target {
        let commands = commands
            .iter()
            .map(|c| format!("{c:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        let src = format!(
            "name = \"edit\"\ntype = \"sed\"\n[config]\npath = {:?}\ncommands = [{commands}]\n",
            path.display().to_string(),
        );
        toml::from_str(&src).expect("test target should decode")
    }

    #[test]
    fn current_state_of_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = sed_target(&dir.path().join("absent"), &["s/a/b/"]);
        let state = SedExecutor::new(MockRunner::ok())
            .current_state(&target)
            .unwrap();
        assert_eq!(state["exists"], Value::Bool(false));
        assert_eq!(state["content"], Value::String(String::new()));
    }

    #[test]
    fn current_state_of_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "hello\n").unwrap();
        let target = sed_target(&path, &["s/a/b/"]);
        let state = SedExecutor::new(MockRunner::ok())
            .current_state(&target)
            .unwrap();
        assert_eq!(state["exists"], Value::Bool(true));
        assert_eq!(state["content"], Value::String("hello\n".to_string()));
    }

    #[test]
    fn apply_streams_file_through_sed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "old text\nkeep\n").unwrap();

        let target = sed_target(&path, &["s/old/new/"]);
        let exec = SedExecutor::new(SystemRunner);

        let current = exec.current_state(&target).unwrap();
        let diff = compute_diff_with_current("edit", &target.desired_state(), &current);
        exec.apply(&target, &diff).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "new text\nkeep\n"
        );
    }

    #[test]
    fn commands_join_into_one_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "a b\n").unwrap();

        let target = sed_target(&path, &["s/a/x/", "s/b/y/"]);
        let exec = SedExecutor::new(SystemRunner);

        let current = exec.current_state(&target).unwrap();
        let diff = compute_diff_with_current("edit", &target.desired_state(), &current);
        exec.apply(&target, &diff).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x y\n");
    }

    #[test]
    fn backup_precedes_the_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "original\n").unwrap();

        let src = format!(
            "name = \"edit\"\ntype = \"sed\"\n[config]\npath = {:?}\ncommands = [\"s/original/changed/\"]\nbackup = true\n",
            path.display().to_string(),
        );
        let target: Target = toml::from_str(&src).unwrap();
        let exec = SedExecutor::new(SystemRunner);

        let current = exec.current_state(&target).unwrap();
        let diff = compute_diff_with_current("edit", &target.desired_state(), &current);
        exec.apply(&target, &diff).unwrap();

        let backup = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .find(|e| e.file_name().to_string_lossy().starts_with("f."))
            .expect("backup file expected");
        assert_eq!(
            std::fs::read_to_string(backup.path()).unwrap(),
            "original\n",
            "backup holds the pre-edit content"
        );
    }

    #[test]
    fn empty_diff_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "untouched\n").unwrap();

        let target = sed_target(&path, &["s/a/b/"]);
        SedExecutor::new(MockRunner::ok())
            .apply(&target, &Diff::default())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "untouched\n");
    }

    #[test]
    fn validate_requires_commands() {
        let dir = tempfile::tempdir().unwrap();
        let src = format!(
            "name = \"edit\"\ntype = \"sed\"\n[config]\npath = {:?}\ncommands = []\n",
            dir.path().join("f").display().to_string(),
        );
        let target: Target = toml::from_str(&src).unwrap();
        assert!(SedExecutor::new(MockRunner::ok()).validate(&target).is_err());
    }
}
