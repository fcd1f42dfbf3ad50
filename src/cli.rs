use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI entry point for the configuration reconciliation engine.
#[derive(Parser, Debug)]
#[command(
    name = "confsync",
    about = "Declarative configuration reconciliation engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Path to the configuration file or directory
    #[arg(short, long, global = true, default_value = "config/")]
    pub config: PathBuf,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply configuration to the target system
    Apply(ApplyOpts),
    /// Check configuration status on the target system
    Status(StatusOpts),
    /// List configured targets
    List(ListOpts),
    /// Generate a config document from the diff between two states
    Generate(GenerateOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Stable name used for the per-command log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Apply(_) => "apply",
            Self::Status(_) => "status",
            Self::List(_) => "list",
            Self::Generate(_) => "generate",
            Self::Version => "version",
        }
    }
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ApplyOpts {
    /// Limit the run to these target names
    pub targets: Vec<String>,

    /// Apply even if validation fails
    #[arg(long)]
    pub force: bool,

    /// Create backups of files before modification
    #[arg(long)]
    pub backup: bool,
}

/// Options for the `status` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct StatusOpts {
    /// Limit the check to these target names
    pub targets: Vec<String>,
}

/// Output format for `list`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Table,
    Json,
    Yaml,
}

/// Options for the `list` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ListOpts {
    /// Show detailed information about targets
    #[arg(short, long)]
    pub long: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ListFormat::Table)]
    pub format: ListFormat,
}

/// Options for the `generate` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct GenerateOpts {
    /// State to read the desired content from (path for file/sed targets)
    pub source: String,

    /// State the generated target will converge (path for file/sed targets)
    pub dest: String,

    /// Target type to generate
    #[arg(short = 't', long = "type")]
    pub target_type: String,

    /// Name for the generated target (defaults to a normalized dest path)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output file path for the generated document
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File format for file targets (overrides extension detection)
    #[arg(long)]
    pub file_format: Option<String>,
}
