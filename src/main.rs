use anyhow::Result;
use clap::Parser;

use confsync::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command_name = args.command.name();
    logging::init_subscriber(args.verbose, command_name);
    let log = logging::Logger::new(command_name);

    match args.command {
        cli::Command::Apply(opts) => commands::apply::run(&args.global, &opts, &log),
        cli::Command::Status(opts) => commands::status::run(&args.global, &opts, &log),
        cli::Command::List(opts) => commands::list::run(&args.global, &opts),
        cli::Command::Generate(opts) => commands::generate::run(&args.global, &opts),
        cli::Command::Version => {
            let version = option_env!("CONFSYNC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("confsync {version}");
            Ok(())
        }
    }
}
