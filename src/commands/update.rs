//! Command: update every manager.
use anyhow::Result;

use super::{CommandSetup, finish};

/// Run the update command.
///
/// # Errors
///
/// Returns an error if any manager failed to update.
pub fn run(setup: &CommandSetup) -> Result<()> {
    let managers = setup.root.all();
    finish(setup.root.update(&managers), &setup.log)
}
