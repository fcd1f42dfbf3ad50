//! Typed configuration: model, schema-validated loading, and merging.
//!
//! Configuration lives in TOML documents decoded through serde into the
//! strongly typed model — the type definitions compiled into the binary
//! *are* the schema, and a decode failure in any file fails the whole
//! load. A config path may be a single `.toml` file or a directory walked
//! recursively; lexicographic order of the full paths defines the merge
//! order, so `01-base.toml` always merges before `02-site.toml`.

mod target;
mod value;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::ConfigError;

pub use target::{
    DconfConfig, FileConfig, SUPPORTED_FORMATS, SedConfig, SystemdConfig, Target, TargetConfig,
    TargetKind,
};
pub use value::{Map, Value, deep_merge};

/// Shell scripts run around a reconciliation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Hooks {
    #[serde(default)]
    pub pre_apply: Vec<String>,
    #[serde(default)]
    pub post_apply: Vec<String>,
}

/// The merged configuration for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemConfig {
    pub targets: Vec<Target>,
    pub variables: Map,
    pub hooks: Option<Hooks>,
}

impl SystemConfig {
    /// Select targets by name, preserving configured order.
    ///
    /// An empty `names` list selects everything.
    ///
    /// # Errors
    ///
    /// Fails when nothing is configured, or when explicit names match no
    /// target.
    pub fn select_targets(&self, names: &[String]) -> Result<Vec<Target>, ConfigError> {
        let selected: Vec<Target> = if names.is_empty() {
            self.targets.clone()
        } else {
            self.targets
                .iter()
                .filter(|target| names.contains(&target.name))
                .cloned()
                .collect()
        };

        if selected.is_empty() {
            if names.is_empty() {
                return Err(ConfigError::NoTargets);
            }
            return Err(ConfigError::NoMatch(names.join(", ")));
        }

        Ok(selected)
    }
}

/// The shape of one configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    #[serde(default)]
    targets: Vec<Target>,
    #[serde(default)]
    variables: Map,
    #[serde(default)]
    hooks: Option<Hooks>,
}

/// Loads and merges configuration from a file or directory tree.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    #[must_use]
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load every config file in merge order and fold them into one
    /// [`SystemConfig`].
    ///
    /// Like-named targets are deep-merged (§ target merge rules); variables
    /// are last-writer-wins per key; hooks are last-non-nil-wins as a whole.
    ///
    /// # Errors
    ///
    /// Fails on unreadable paths, schema violations (with the offending
    /// file named), and target merge conflicts.
    pub fn load(&self) -> Result<SystemConfig, ConfigError> {
        let file_paths = self.collect_files()?;

        let mut merged = SystemConfig::default();

        for file_path in file_paths {
            let document = Self::load_file(&file_path)?;

            for target in document.targets {
                let known = merged
                    .targets
                    .iter()
                    .position(|existing| existing.name == target.name);
                match known {
                    Some(index) => merged.targets[index].merge_from(target)?,
                    None => merged.targets.push(target),
                }
            }

            merged.variables.extend(document.variables);

            if document.hooks.is_some() {
                merged.hooks = document.hooks;
            }
        }

        Ok(merged)
    }

    /// Gather `.toml` files from the config path in lexicographic order.
    fn collect_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let path = &self.config_path;
        let metadata = std::fs::metadata(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut file_paths = Vec::new();
        if metadata.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry.map_err(|err| ConfigError::Read {
                    path: path.display().to_string(),
                    source: err.into(),
                })?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "toml")
                {
                    file_paths.push(entry.into_path());
                }
            }
        } else {
            if path.extension().is_none_or(|ext| ext != "toml") {
                return Err(ConfigError::BadExtension(path.display().to_string()));
            }
            file_paths.push(path.clone());
        }

        file_paths.sort();
        Ok(file_paths)
    }

    fn load_file(path: &Path) -> Result<ConfigDocument, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}
