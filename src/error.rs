//! Domain-specific error types for the reconciliation engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors ([`ConfigError`], [`ValidationError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator. Environment failures
//! (file I/O, external processes) stay as `anyhow` errors wrapped with the
//! target name and operation.

use thiserror::Error;

/// Errors that arise from configuration loading and merging.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("read config file {path}: {source}")]
    Read {
        /// Path of the file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file failed schema-validated decoding.
    #[error("invalid config in {path}: {message}")]
    Parse { path: String, message: String },

    /// The config path is neither a `.toml` file nor a directory.
    #[error("config file must have .toml extension: {0}")]
    BadExtension(String),

    /// Two files define the same target name with different types.
    #[error("cannot merge target '{name}': type mismatch ({existing} vs {incoming})")]
    TypeMismatch {
        name: String,
        existing: String,
        incoming: String,
    },

    /// The target type does not support merging across files.
    #[error("target '{name}': {kind} targets cannot be merged across files")]
    UnsupportedMerge { name: String, kind: String },

    /// No targets are configured at all.
    #[error("no targets configured")]
    NoTargets,

    /// Explicitly requested target names matched nothing.
    #[error("no targets found matching any of: {0}")]
    NoMatch(String),
}

/// Errors from structural validation of a target's typed config.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required field is empty or missing.
    #[error("{field} is required for {kind} target")]
    MissingField {
        /// Target kind (`file`, `dconf`, `systemd`, `sed`).
        kind: &'static str,
        /// The offending field.
        field: &'static str,
    },

    /// A file target names a format with no registered codec.
    #[error("unsupported file format: {0} (supported: ini, yaml, toml, json, xml)")]
    UnsupportedFormat(String),

    /// The target's name is empty.
    #[error("target name must not be empty")]
    EmptyName,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn config_error_read_display() {
        let e = ConfigError::Read {
            path: "/etc/confsync/main.toml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("/etc/confsync/main.toml"));
    }

    #[test]
    fn config_error_read_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Read {
            path: "x".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn config_error_type_mismatch_display() {
        let e = ConfigError::TypeMismatch {
            name: "web".to_string(),
            existing: "file".to_string(),
            incoming: "dconf".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "cannot merge target 'web': type mismatch (file vs dconf)"
        );
    }

    #[test]
    fn validation_error_missing_field_display() {
        let e = ValidationError::MissingField {
            kind: "dconf",
            field: "schema",
        };
        assert_eq!(e.to_string(), "schema is required for dconf target");
    }

    #[test]
    fn validation_error_unsupported_format_display() {
        let e = ValidationError::UnsupportedFormat("hocon".to_string());
        assert!(e.to_string().contains("hocon"));
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let e: anyhow::Error = ConfigError::NoTargets.into();
        assert!(e.to_string().contains("no targets"));
        let e: anyhow::Error = ValidationError::EmptyName.into();
        assert!(e.to_string().contains("name"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ValidationError>();
    }
}
