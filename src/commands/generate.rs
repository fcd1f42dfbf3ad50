//! The `generate` command: read two states through an executor, compute
//! the state-to-state diff, and emit it as a desired-state config document.

use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow};
use serde::Serialize;

use crate::cli::{GenerateOpts, GlobalOpts};
use crate::config::{
    DconfConfig, FileConfig, Map, SedConfig, SystemdConfig, Target, TargetConfig, TargetKind,
    Value,
};
use crate::executors::ExecutorRegistry;

pub fn run(global: &GlobalOpts, opts: &GenerateOpts) -> Result<()> {
    let kind: TargetKind = opts.target_type.parse().map_err(|err: String| anyhow!(err))?;

    tracing::info!(
        "Generating diff between '{}' and '{}'",
        opts.source,
        opts.dest
    );

    let name = opts
        .name
        .clone()
        .unwrap_or_else(|| normalize_name(&opts.dest));

    let registry = ExecutorRegistry::new();
    let executor = registry.executor(kind)?;

    let source_target = synthetic_target(kind, &opts.source, opts.file_format.as_deref());
    let source_state = executor
        .current_state(&source_target)
        .context("get source state")?;

    // A missing destination reads as empty: everything becomes new content.
    let dest_target = synthetic_target(kind, &opts.dest, opts.file_format.as_deref());
    let dest_state = executor.current_state(&dest_target).unwrap_or_default();

    let diff = compute_simple_diff(&dest_state, &source_state);
    if diff.is_empty() {
        tracing::warn!("No differences found between states");
        return Ok(());
    }

    let document = build_document(kind, &name, &opts.dest, diff, opts.file_format.as_deref());
    let text = toml::to_string_pretty(&document).context("serialize generated document")?;

    let output_path = resolve_output_path(global, opts, &name);
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    std::fs::write(&output_path, text)
        .with_context(|| format!("write output to {}", output_path.display()))?;

    tracing::info!("Successfully generated: {}", output_path.display());
    Ok(())
}

/// A throwaway target pointing an executor at a path/schema/unit.
fn synthetic_target(kind: TargetKind, location: &str, file_format: Option<&str>) -> Target {
    let config = match kind {
        TargetKind::File => TargetConfig::File(FileConfig {
            path: location.to_string(),
            format: detect_format(location, file_format),
            owner: None,
            group: None,
            mode: None,
            backup: false,
            content: Map::new(),
            options: Map::new(),
        }),
        TargetKind::Dconf => TargetConfig::Dconf(DconfConfig {
            user: None,
            schema: location.to_string(),
            settings: Map::new(),
        }),
        TargetKind::Systemd => TargetConfig::Systemd(SystemdConfig {
            unit: location.to_string(),
            section: String::new(),
            properties: Map::new(),
            backup: false,
            reload: false,
        }),
        TargetKind::Sed => TargetConfig::Sed(SedConfig {
            path: location.to_string(),
            commands: Vec::new(),
            backup: false,
        }),
    };

    Target {
        name: "target".to_string(),
        metadata: Map::new(),
        config,
    }
}

/// Keys of `desired` that are new or different relative to `current`,
/// nested maps compared recursively.
fn compute_simple_diff(current: &Map, desired: &Map) -> Map {
    let mut diff = Map::new();
    for (key, desired_value) in desired {
        match current.get(key) {
            None => {
                diff.insert(key.clone(), desired_value.clone());
            }
            Some(current_value) if current_value != desired_value => {
                if let Some(value_diff) = compute_value_diff(current_value, desired_value) {
                    diff.insert(key.clone(), value_diff);
                }
            }
            Some(_) => {}
        }
    }
    diff
}

fn compute_value_diff(current_value: &Value, desired_value: &Value) -> Option<Value> {
    if let (Value::Map(current_map), Value::Map(desired_map)) = (current_value, desired_value) {
        let nested = compute_simple_diff(current_map, desired_map);
        if nested.is_empty() {
            return None;
        }
        return Some(Value::Map(nested));
    }
    Some(desired_value.clone())
}

/// The generated document: a single-target config in the schema language.
#[derive(Serialize)]
struct Document {
    targets: Vec<Target>,
}

fn build_document(
    kind: TargetKind,
    name: &str,
    dest: &str,
    diff: Map,
    file_format: Option<&str>,
) -> Document {
    let config = match kind {
        TargetKind::File => TargetConfig::File(FileConfig {
            path: dest.to_string(),
            format: detect_format(dest, file_format),
            owner: None,
            group: None,
            mode: None,
            backup: false,
            content: diff,
            options: Map::new(),
        }),
        TargetKind::Sed => {
            let commands = match diff.get("commands") {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(ToString::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            TargetConfig::Sed(SedConfig {
                path: dest.to_string(),
                commands,
                backup: false,
            })
        }
        TargetKind::Dconf => TargetConfig::Dconf(DconfConfig {
            user: None,
            schema: dest.to_string(),
            settings: diff,
        }),
        TargetKind::Systemd => TargetConfig::Systemd(SystemdConfig {
            unit: dest.to_string(),
            section: String::new(),
            properties: diff,
            backup: false,
            reload: false,
        }),
    };

    Document {
        targets: vec![Target {
            name: name.to_string(),
            metadata: Map::new(),
            config,
        }],
    }
}

fn resolve_output_path(global: &GlobalOpts, opts: &GenerateOpts, name: &str) -> PathBuf {
    if let Some(output) = &opts.output {
        return output.clone();
    }
    if global.config.as_os_str().is_empty() {
        return PathBuf::from(format!("{name}.toml"));
    }
    if global.config.is_dir() {
        return global.config.join(format!("{name}.toml"));
    }
    global.config.clone()
}

/// Detect a file format from the extension, with an explicit override
/// taking precedence. Unknown extensions yield an empty format, which the
/// codec registry rejects with a clear error.
fn detect_format(path: &str, file_format: Option<&str>) -> String {
    if let Some(format) = file_format
        && !format.is_empty()
    {
        return format.to_string();
    }

    let extension = std::path::Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "ini" | "conf" => "ini",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "json" => "json",
        "xml" => "xml",
        _ => "",
    }
    .to_string()
}

/// Normalize a source path into a target name: alphanumerics kept,
/// everything else collapsed to single dashes.
fn normalize_name(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    for c in source.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
        } else {
            result.push('-');
        }
    }

    while result.contains("--") {
        result = result.replace("--", "-");
    }

    result.trim_matches('-').to_string()
}
