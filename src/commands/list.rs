//! The `list` command: print configured targets as a table, JSON, or YAML.

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, ListFormat, ListOpts};
use crate::config::{ConfigLoader, Target, TargetConfig};

pub fn run(global: &GlobalOpts, opts: &ListOpts) -> Result<()> {
    let system_config = ConfigLoader::new(&global.config).load()?;

    if system_config.targets.is_empty() {
        println!("No targets configured.");
        return Ok(());
    }

    match opts.format {
        ListFormat::Json => output_json(&system_config.targets, opts.long),
        ListFormat::Yaml => output_yaml(&system_config.targets, opts.long),
        ListFormat::Table => {
            output_table(&system_config.targets, opts.long);
            Ok(())
        }
    }
}

/// The short name/type row used by the non-long output modes.
#[derive(Serialize)]
struct TargetSummary<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

fn summaries(targets: &[Target]) -> Vec<TargetSummary<'_>> {
    targets
        .iter()
        .map(|target| TargetSummary {
            name: &target.name,
            kind: target.kind().as_str(),
        })
        .collect()
}

fn output_json(targets: &[Target], long: bool) -> Result<()> {
    let text = if long {
        serde_json::to_string_pretty(targets)
    } else {
        serde_json::to_string_pretty(&summaries(targets))
    }
    .context("marshal JSON")?;
    println!("{text}");
    Ok(())
}

fn output_yaml(targets: &[Target], long: bool) -> Result<()> {
    let text = if long {
        serde_yaml::to_string(targets)
    } else {
        serde_yaml::to_string(&summaries(targets))
    }
    .context("marshal YAML")?;
    print!("{text}");
    Ok(())
}

fn output_table(targets: &[Target], long: bool) {
    let name_width = targets
        .iter()
        .map(|t| t.name.len())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);
    let type_width = "systemd".len();

    if long {
        println!("{:<name_width$}  {:<type_width$}  DETAILS", "NAME", "TYPE");
        for target in targets {
            println!(
                "{:<name_width$}  {:<type_width$}  {}",
                target.name,
                target.kind().as_str(),
                target_details(target),
            );
        }
    } else {
        println!("{:<name_width$}  TYPE", "NAME");
        for target in targets {
            println!("{:<name_width$}  {}", target.name, target.kind().as_str());
        }
    }
}

/// One-line detail column per target kind.
fn target_details(target: &Target) -> String {
    match &target.config {
        TargetConfig::File(config) => {
            format!("path={} format={}", config.path, config.format)
        }
        TargetConfig::Dconf(config) => format!("schema={}", config.schema),
        TargetConfig::Systemd(config) => {
            format!("unit={} section={}", config.unit, config.section)
        }
        TargetConfig::Sed(config) => {
            format!("path={} commands={}", config.path, config.commands.len())
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn targets() -> Vec<Target> {
        let doc = "\
[[targets]]\nname = \"app\"\ntype = \"file\"\n[targets.config]\npath = \"/tmp/app.conf\"\n\n\
[[targets]]\nname = \"desktop\"\ntype = \"dconf\"\n[targets.config]\nschema = \"/org/gnome\"\n";
        #[derive(serde::Deserialize)]
        struct Doc {
            targets: Vec<Target>,
        }
        toml::from_str::<Doc>(doc).unwrap().targets
    }

    #[test]
    fn summaries_carry_name_and_type() {
        let targets = targets();
        let rows = summaries(&targets);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "app");
        assert_eq!(rows[0].kind, "file");
        assert_eq!(rows[1].kind, "dconf");
    }

    #[test]
    fn details_name_the_interesting_fields() {
        let targets = targets();
        assert_eq!(
            target_details(&targets[0]),
            "path=/tmp/app.conf format=ini"
        );
        assert_eq!(target_details(&targets[1]), "schema=/org/gnome");
    }

    #[test]
    fn short_summaries_serialize_to_json() {
        let targets = targets();
        let json = serde_json::to_string(&summaries(&targets)).unwrap();
        assert!(json.contains("\"name\":\"app\""), "{json}");
        assert!(json.contains("\"type\":\"file\""), "{json}");
    }
}
