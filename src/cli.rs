//! Command-line definitions.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

/// Top-level CLI entry point for punkt.
#[derive(Parser, Debug)]
#[command(
    name = "punkt",
    about = "Manage dotfiles, symlinks and the package managers around them",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (forces the debug log level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Config file to read (default ~/.config/punkt/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding punkt's own configuration (default ~/.config/punkt)
    #[arg(long, global = true)]
    pub punkt_home: Option<PathBuf>,

    /// Directory holding the dotfiles (default ~/.dotfiles)
    #[arg(long, global = true)]
    pub dotfiles: Option<PathBuf>,

    /// Log level: debug, info, warn or error
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

impl GlobalOpts {
    /// The configuration overrides given on the command line.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            punkt_home: self.punkt_home.clone(),
            dotfiles: self.dotfiles.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start managing a file or repository
    Add {
        /// What to add.
        #[command(subcommand)]
        what: AddCommand,
    },
    /// Stop managing a file or repository
    Remove {
        /// What to remove.
        #[command(subcommand)]
        what: RemoveCommand,
    },
    /// Save the current state of every manager to its config file
    Dump,
    /// Bring the system in line with the saved configuration
    Ensure,
    /// Update every manager
    Update,
    /// Print version information
    Version,
}

/// Targets of `punkt add`.
#[derive(Subcommand, Debug)]
pub enum AddCommand {
    /// Move a file into the dotfiles directory and link it back
    Symlink {
        /// Existing file or directory to manage
        target: PathBuf,
        /// Where to keep it (derived inside the dotfiles directory if omitted)
        location: Option<PathBuf>,
    },
    /// Record a git repository so it gets cloned on ensure
    Repository {
        /// Path of the repository's working tree
        path: PathBuf,
    },
}

/// Targets of `punkt remove`.
#[derive(Subcommand, Debug)]
pub enum RemoveCommand {
    /// Replace a managed symlink with the file it points to
    Symlink {
        /// The symlink to remove
        link: PathBuf,
    },
    /// Forget a recorded git repository
    Repository {
        /// Path of the repository's working tree
        path: PathBuf,
    },
}
