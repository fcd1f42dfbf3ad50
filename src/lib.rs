//! Declarative configuration reconciliation engine.
//!
//! Targets — structured files (INI with byte-level structure preservation,
//! plus YAML/TOML/JSON/XML), GNOME dconf schemas, systemd units, and
//! sed-editable text files — are declared in typed TOML, compared against
//! live system state, and converged, with an optional dry-run preview.
//!
//! The public API is organised in layers:
//!
//! - **[`config`]** — the typed model, schema-validated loading, merging
//! - **[`formats`]** — file codecs behind one marshal/unmarshal interface
//! - **[`state`]** — managed-key filtering and the flattening diff
//! - **[`executors`]** — per-target-kind validate/read/apply drivers
//! - **[`engine`]** — the per-target reconciliation loop
//! - **[`commands`]** — top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backup;
pub mod cli;
pub mod color;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod executors;
pub mod formats;
pub mod hooks;
pub mod logging;
pub mod state;
