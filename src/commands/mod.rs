//! Top-level subcommand orchestration.
pub mod add;
pub mod dump;
pub mod ensure;
pub mod remove;
pub mod update;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::RunError;
use crate::exec::SystemExecutor;
use crate::logging::{self, Logger};
use crate::managers::RootManager;
use crate::operations::SystemFileSystemOps;

/// Shared state produced by the common command setup sequence.
///
/// Resolves the home and working directories, loads the configuration,
/// installs the tracing subscriber and builds the root manager so that each
/// command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Logger collecting per-manager outcomes for the summary.
    pub log: Arc<Logger>,
    /// Root manager built from the loaded configuration.
    pub root: RootManager,
}

impl CommandSetup {
    /// Load configuration and wire up logging and managers.
    ///
    /// # Errors
    ///
    /// Returns an error if the home or working directory cannot be
    /// determined, or the configuration cannot be loaded.
    pub fn init(global: &GlobalOpts, verbose: bool) -> Result<Self> {
        let home = config::home_dir()?;
        let working_dir =
            std::env::current_dir().context("unable to determine the working directory")?;
        let fs = Arc::new(SystemFileSystemOps);
        let config = Config::load(fs.as_ref(), home, working_dir, global.overrides())?;

        let (level, unknown) = console_level(&config.log_level, verbose);
        let log_file = config.log_file();
        logging::init_subscriber(level, Some(&log_file));
        if unknown {
            tracing::warn!(
                "unknown log level {:?}, using {}",
                config.log_level,
                config::DEFAULT_LOG_LEVEL
            );
        }
        log_loaded(&config, &log_file);

        let log = Arc::new(Logger::new(Some(log_file)));
        let root = RootManager::new(config, fs, Arc::new(SystemExecutor), log.clone());
        Ok(Self { log, root })
    }
}

/// The console level for `configured`, and whether it had to fall back to
/// the default because the name was not recognised.
fn console_level(configured: &str, verbose: bool) -> (LevelFilter, bool) {
    if verbose {
        return (LevelFilter::DEBUG, false);
    }
    logging::parse_level(configured).map_or((LevelFilter::INFO, true), |level| (level, false))
}

fn log_loaded(config: &Config, log_file: &Path) {
    tracing::debug!(
        home = %config.home.display(),
        dotfiles = %config.dotfiles.display(),
        punkt_home = %config.punkt_home.display(),
        "configuration loaded"
    );
    if let Some(file) = &config.config_file {
        tracing::debug!(file = %file.display(), "read config file");
    }
    tracing::debug!(
        "{} generic manager(s), log: {}",
        config.managers.len(),
        log_file.display()
    );
}

/// Print the summary of a lifecycle run and turn its outcome into the
/// command's result.
///
/// # Errors
///
/// Returns the [`RunError`] if any manager failed.
pub fn finish(result: Result<(), RunError>, log: &Logger) -> Result<()> {
    log.print_summary();
    result?;
    Ok(())
}
