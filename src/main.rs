use anyhow::Result;
use clap::Parser;

use punkt::cli::{Cli, Command};
use punkt::commands::{self, CommandSetup};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if matches!(args.command, Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let setup = CommandSetup::init(&args.global, args.verbose)?;
    match &args.command {
        Command::Add { what } => commands::add::run(&setup.root, what, &setup.log),
        Command::Remove { what } => commands::remove::run(&setup.root, what, &setup.log),
        Command::Dump => commands::dump::run(&setup),
        Command::Ensure => commands::ensure::run(&setup),
        Command::Update => commands::update::run(&setup),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
