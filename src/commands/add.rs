//! Command: start managing a file or repository.
use anyhow::Result;

use crate::cli::AddCommand;
use crate::logging::Logger;
use crate::managers::RootManager;

/// Run the add command.
///
/// # Errors
///
/// Returns an error if the symlink or repository cannot be added.  Nothing
/// is recorded in that case.
pub fn run(root: &RootManager, what: &AddCommand, log: &Logger) -> Result<()> {
    match what {
        AddCommand::Symlink { target, location } => {
            let symlink = root.symlink().add(target, location.as_deref())?;
            log.info(&format!("linked {symlink}"));
        }
        AddCommand::Repository { path } => {
            let repo = root.git().add_repository(path)?;
            log.info(&format!("tracking {} from {}", repo.name, repo.remote));
        }
    }
    Ok(())
}
