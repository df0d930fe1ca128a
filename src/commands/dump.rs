//! Command: save the live state of every manager.
use anyhow::Result;

use super::{CommandSetup, finish};

/// Run the dump command.
///
/// # Errors
///
/// Returns an error if any manager failed to dump or save its configuration.
pub fn run(setup: &CommandSetup) -> Result<()> {
    let managers = setup.root.all();
    finish(setup.root.dump(&managers), &setup.log)
}
