//! Target model: the tagged variant at the heart of the configuration.
//!
//! Every target carries a unique name, free-form metadata, and one of four
//! typed configs. The variant tag doubles as the executor lookup key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::{Map, Value, deep_merge};
use crate::error::{ConfigError, ValidationError};

/// File formats a file target may declare.
pub const SUPPORTED_FORMATS: &[&str] = &["ini", "yaml", "toml", "json", "xml"];

/// The four target kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Dconf,
    Systemd,
    Sed,
}

impl TargetKind {
    /// The lowercase tag, as written in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Dconf => "dconf",
            Self::Systemd => "systemd",
            Self::Sed => "sed",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "dconf" => Ok(Self::Dconf),
            "systemd" => Ok(Self::Systemd),
            "sed" => Ok(Self::Sed),
            other => Err(format!("unknown target type: {other}")),
        }
    }
}

/// A named configuration artifact under the engine's management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Target {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map,
    #[serde(flatten)]
    pub config: TargetConfig,
}

/// Type-specific configuration, tagged by `type` with the payload under
/// `config` — matching the document layout:
///
/// ```toml
/// [[targets]]
/// name = "app"
/// type = "file"
/// [targets.config]
/// path = "/etc/app.conf"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum TargetConfig {
    File(FileConfig),
    Dconf(DconfConfig),
    Systemd(SystemdConfig),
    Sed(SedConfig),
}

impl Target {
    /// The variant tag of this target.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self.config {
            TargetConfig::File(_) => TargetKind::File,
            TargetConfig::Dconf(_) => TargetKind::Dconf,
            TargetConfig::Systemd(_) => TargetKind::Systemd,
            TargetConfig::Sed(_) => TargetKind::Sed,
        }
    }

    /// Structural validation: required fields and enumerations.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        match &self.config {
            TargetConfig::File(config) => config.validate(),
            TargetConfig::Dconf(config) => config.validate(),
            TargetConfig::Systemd(config) => config.validate(),
            TargetConfig::Sed(config) => config.validate(),
        }
    }

    /// Project the desired state this target declares, in the shape the
    /// matching executor reads back from the system.
    #[must_use]
    pub fn desired_state(&self) -> Map {
        match &self.config {
            TargetConfig::File(config) => config.content.clone(),
            TargetConfig::Dconf(config) => config.settings.clone(),
            TargetConfig::Systemd(config) => config.properties.clone(),
            TargetConfig::Sed(config) => {
                let mut state = Map::new();
                state.insert(
                    "commands".to_string(),
                    Value::Array(
                        config
                            .commands
                            .iter()
                            .map(|command| Value::String(command.clone()))
                            .collect(),
                    ),
                );
                state.insert("path".to_string(), Value::String(config.path.clone()));
                state
            }
        }
    }

    /// Deep-merge another definition of the same target into this one.
    ///
    /// # Errors
    ///
    /// Fails when the types differ or the kind does not support merging.
    pub fn merge_from(&mut self, incoming: Target) -> Result<(), ConfigError> {
        deep_merge(&mut self.metadata, incoming.metadata);

        match (&mut self.config, incoming.config) {
            (TargetConfig::File(existing), TargetConfig::File(new)) => {
                existing.merge_from(new);
                Ok(())
            }
            (TargetConfig::Dconf(existing), TargetConfig::Dconf(new)) => {
                existing.merge_from(new);
                Ok(())
            }
            (TargetConfig::Systemd(existing), TargetConfig::Systemd(new)) => {
                existing.merge_from(new);
                Ok(())
            }
            (TargetConfig::Sed(_), TargetConfig::Sed(_)) => Err(ConfigError::UnsupportedMerge {
                name: self.name.clone(),
                kind: TargetKind::Sed.to_string(),
            }),
            (existing, incoming) => Err(ConfigError::TypeMismatch {
                name: self.name.clone(),
                existing: existing.kind_str().to_string(),
                incoming: incoming.kind_str().to_string(),
            }),
        }
    }
}

impl TargetConfig {
    const fn kind_str(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Dconf(_) => "dconf",
            Self::Systemd(_) => "systemd",
            Self::Sed(_) => "sed",
        }
    }
}

fn default_format() -> String {
    "ini".to_string()
}

/// Configuration for a structured-file target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub path: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// POSIX mode as an octal string (e.g. `"0644"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub content: Map,
    /// Format-specific options (for INI: `use_spacing`, `comment_chars`,
    /// `delimiter`).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map,
}

impl FileConfig {
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.is_empty() {
            return Err(ValidationError::MissingField {
                kind: "file",
                field: "path",
            });
        }
        if !SUPPORTED_FORMATS.contains(&self.format.as_str()) {
            return Err(ValidationError::UnsupportedFormat(self.format.clone()));
        }
        Ok(())
    }

    fn merge_from(&mut self, incoming: Self) {
        deep_merge(&mut self.content, incoming.content);
        deep_merge(&mut self.options, incoming.options);

        if !incoming.path.is_empty() {
            self.path = incoming.path;
        }
        if !incoming.format.is_empty() {
            self.format = incoming.format;
        }
        if incoming.owner.is_some() {
            self.owner = incoming.owner;
        }
        if incoming.group.is_some() {
            self.group = incoming.group;
        }
        if incoming.mode.is_some() {
            self.mode = incoming.mode;
        }
        if incoming.backup {
            self.backup = true;
        }
    }
}

/// Configuration for a GNOME dconf target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DconfConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub schema: String,
    #[serde(default)]
    pub settings: Map,
}

impl DconfConfig {
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema.is_empty() {
            return Err(ValidationError::MissingField {
                kind: "dconf",
                field: "schema",
            });
        }
        Ok(())
    }

    fn merge_from(&mut self, incoming: Self) {
        deep_merge(&mut self.settings, incoming.settings);
        if !incoming.schema.is_empty() {
            self.schema = incoming.schema;
        }
        if incoming.user.is_some() {
            self.user = incoming.user;
        }
    }
}

/// Configuration for a systemd unit target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SystemdConfig {
    pub unit: String,
    pub section: String,
    #[serde(default)]
    pub properties: Map,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub reload: bool,
}

impl SystemdConfig {
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.unit.is_empty() {
            return Err(ValidationError::MissingField {
                kind: "systemd",
                field: "unit",
            });
        }
        if self.section.is_empty() {
            return Err(ValidationError::MissingField {
                kind: "systemd",
                field: "section",
            });
        }
        Ok(())
    }

    fn merge_from(&mut self, incoming: Self) {
        deep_merge(&mut self.properties, incoming.properties);
        if !incoming.unit.is_empty() {
            self.unit = incoming.unit;
        }
        if !incoming.section.is_empty() {
            self.section = incoming.section;
        }
        if incoming.reload {
            self.reload = true;
        }
    }
}

/// Configuration for a stream-editor target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SedConfig {
    pub path: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub backup: bool,
}

impl SedConfig {
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.is_empty() {
            return Err(ValidationError::MissingField {
                kind: "sed",
                field: "path",
            });
        }
        if self.commands.is_empty() {
            return Err(ValidationError::MissingField {
                kind: "sed",
                field: "commands",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn file_target(toml_src: &str) -> Target {
        toml::from_str(toml_src).expect("target TOML should decode")
    }

    const FILE_TARGET: &str = r#"
name = "app"
type = "file"
[metadata]
note = "demo"
[config]
path = "/tmp/app.conf"
format = "ini"
[config.content.database]
host = "newhost"
"#;

    #[test]
    fn decode_file_target() {
        let target = file_target(FILE_TARGET);
        assert_eq!(target.name, "app");
        assert_eq!(target.kind(), TargetKind::File);
        let TargetConfig::File(config) = &target.config else {
            panic!("expected file config");
        };
        assert_eq!(config.path, "/tmp/app.conf");
        assert_eq!(config.format, "ini");
        let database = config.content["database"].as_map().unwrap();
        assert_eq!(database["host"], Value::String("newhost".to_string()));
    }

    #[test]
    fn format_defaults_to_ini() {
        let target = file_target(
            "name = \"t\"\ntype = \"file\"\n[config]\npath = \"/tmp/x\"\n",
        );
        let TargetConfig::File(config) = &target.config else {
            panic!("expected file config");
        };
        assert_eq!(config.format, "ini");
    }

    #[test]
    fn unknown_config_field_is_rejected() {
        let result: Result<Target, _> = toml::from_str(
            "name = \"t\"\ntype = \"file\"\n[config]\npath = \"/tmp/x\"\nbogus = 1\n",
        );
        assert!(result.is_err(), "schema validation should reject bogus field");
    }

    #[test]
    fn unknown_target_type_is_rejected() {
        let result: Result<Target, _> =
            toml::from_str("name = \"t\"\ntype = \"registry\"\n[config]\n");
        assert!(result.is_err());
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            TargetKind::File,
            TargetKind::Dconf,
            TargetKind::Systemd,
            TargetKind::Sed,
        ] {
            assert_eq!(kind.as_str().parse::<TargetKind>().unwrap(), kind);
        }
        assert!("registry".parse::<TargetKind>().is_err());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut target = file_target(FILE_TARGET);
        target.name.clear();
        assert!(matches!(
            target.validate(),
            Err(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn validate_rejects_unknown_format() {
        let mut target = file_target(FILE_TARGET);
        if let TargetConfig::File(config) = &mut target.config {
            config.format = "hocon".to_string();
        }
        assert!(matches!(
            target.validate(),
            Err(ValidationError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn validate_dconf_requires_schema() {
        let config = DconfConfig {
            user: None,
            schema: String::new(),
            settings: Map::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_systemd_requires_unit_and_section() {
        let config = SystemdConfig {
            unit: "nginx.service".to_string(),
            section: String::new(),
            properties: Map::new(),
            backup: false,
            reload: false,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingField {
                field: "section",
                ..
            })
        ));
    }

    #[test]
    fn validate_sed_requires_commands() {
        let config = SedConfig {
            path: "/tmp/f".to_string(),
            commands: Vec::new(),
            backup: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn desired_state_projects_file_content() {
        let target = file_target(FILE_TARGET);
        let state = target.desired_state();
        assert!(state.contains_key("database"));
    }

    #[test]
    fn desired_state_projects_sed_shape() {
        let target: Target = toml::from_str(
            "name = \"s\"\ntype = \"sed\"\n[config]\npath = \"/tmp/f\"\ncommands = [\"s/a/b/\"]\n",
        )
        .unwrap();
        let state = target.desired_state();
        assert_eq!(state["path"], Value::String("/tmp/f".to_string()));
        assert_eq!(
            state["commands"],
            Value::Array(vec![Value::String("s/a/b/".to_string())])
        );
    }

    #[test]
    fn merge_file_targets_unions_content() {
        let mut base = file_target(
            "name = \"web\"\ntype = \"file\"\n[config]\npath = \"/tmp/w\"\n[config.content.server]\nport = \"80\"\n",
        );
        let incoming = file_target(
            "name = \"web\"\ntype = \"file\"\n[config]\npath = \"/tmp/w\"\nbackup = true\n[config.content.server]\nhost = \"localhost\"\n",
        );
        base.merge_from(incoming).unwrap();

        let TargetConfig::File(config) = &base.config else {
            panic!("expected file config");
        };
        let server = config.content["server"].as_map().unwrap();
        assert_eq!(server["port"], Value::String("80".to_string()));
        assert_eq!(server["host"], Value::String("localhost".to_string()));
        assert!(config.backup, "backup is set if either side sets it");
    }

    #[test]
    fn merge_rejects_type_mismatch() {
        let mut base = file_target(FILE_TARGET);
        let incoming: Target = toml::from_str(
            "name = \"app\"\ntype = \"dconf\"\n[config]\nschema = \"/org/gnome\"\n",
        )
        .unwrap();
        assert!(matches!(
            base.merge_from(incoming),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn merge_rejects_sed_targets() {
        let src =
            "name = \"s\"\ntype = \"sed\"\n[config]\npath = \"/tmp/f\"\ncommands = [\"s/a/b/\"]\n";
        let mut base: Target = toml::from_str(src).unwrap();
        let incoming: Target = toml::from_str(src).unwrap();
        assert!(matches!(
            base.merge_from(incoming),
            Err(ConfigError::UnsupportedMerge { .. })
        ));
    }

    #[test]
    fn merge_systemd_ors_reload() {
        let mut base: Target = toml::from_str(
            "name = \"n\"\ntype = \"systemd\"\n[config]\nunit = \"nginx.service\"\nsection = \"Service\"\n",
        )
        .unwrap();
        let incoming: Target = toml::from_str(
            "name = \"n\"\ntype = \"systemd\"\n[config]\nunit = \"nginx.service\"\nsection = \"Service\"\nreload = true\n",
        )
        .unwrap();
        base.merge_from(incoming).unwrap();
        let TargetConfig::Systemd(config) = &base.config else {
            panic!("expected systemd config");
        };
        assert!(config.reload);
    }
}
