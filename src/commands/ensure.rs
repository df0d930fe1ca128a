//! Command: converge the system to the saved configuration.
use anyhow::Result;

use super::{CommandSetup, finish};

/// Run the ensure command.
///
/// # Errors
///
/// Returns an error if any manager, or any symlink it declares, failed.
pub fn run(setup: &CommandSetup) -> Result<()> {
    let managers = setup.root.all();
    finish(setup.root.ensure(&managers), &setup.log)
}
