//! Command: stop managing a file or repository.
use anyhow::Result;

use crate::cli::RemoveCommand;
use crate::logging::Logger;
use crate::managers::RootManager;

/// Run the remove command.
///
/// # Errors
///
/// Returns an error if the symlink cannot be undone or the repository is
/// not recorded.
pub fn run(root: &RootManager, what: &RemoveCommand, log: &Logger) -> Result<()> {
    match what {
        RemoveCommand::Symlink { link } => {
            let (symlink, recorded) = root.symlink().remove(link)?;
            if recorded {
                log.info(&format!("removed {symlink}"));
            } else {
                log.info(&format!("restored {}", symlink.link.display()));
            }
        }
        RemoveCommand::Repository { path } => {
            let repo = root.git().remove_repository(path)?;
            log.info(&format!("no longer tracking {}", repo.name));
        }
    }
    Ok(())
}
