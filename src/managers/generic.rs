//! Managers driven by a user-supplied command table.
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use super::Manager;
use crate::config::ManagerCommands;
use crate::error::{ConfigError, ManagerError};
use crate::exec::Executor;

/// Shell reference to the positional parameter holding the config file.
const CONFIG_FILE_PARAM: &str = "\"$1\"";

/// An external tool wrapped by shell commands, one instance per entry in
/// the configured manager table.
///
/// Commands run through `sh -c`.  `ensure` and `update` receive the
/// manager's config file as `"$1"` and run attached to the
/// terminal; `dump` captures standard output.
#[derive(Debug, Clone)]
pub struct GenericManager {
    name: String,
    commands: ManagerCommands,
    executor: Arc<dyn Executor>,
    config_file: PathBuf,
}

impl GenericManager {
    /// Create a generic manager called `name`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        commands: ManagerCommands,
        executor: Arc<dyn Executor>,
        config_file: PathBuf,
    ) -> Self {
        Self {
            name: name.into(),
            commands,
            executor,
            config_file,
        }
    }

    /// The shell command line for `operation`, with `args` appended.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCommand`] if the table has neither an
    /// override for `operation` nor a fallback `command`.
    pub fn resolve_command(&self, operation: &str, args: &[&str]) -> Result<String, ConfigError> {
        let base = self
            .commands
            .resolve(operation)
            .ok_or_else(|| ConfigError::MissingCommand {
                manager: self.name.clone(),
                operation: operation.to_string(),
            })?;
        let command = std::iter::once(base.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!(manager = %self.name, operation, %command, "resolved command");
        Ok(command)
    }

    /// Run `operation` with the config file as its last argument.  The path
    /// reaches the shell as `$1`, never as part of the command text.
    fn run_attached(&self, operation: &str) -> Result<()> {
        let config_file = self.config_file.to_string_lossy();
        let command = self.resolve_command(operation, &[CONFIG_FILE_PARAM])?;
        let result = self
            .executor
            .run_interactive("sh", &["-c", &command, "sh", &config_file])?;
        if !result.success {
            return Err(ManagerError::CommandFailed {
                manager: self.name.clone(),
                operation: operation.to_string(),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Manager for GenericManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn dump(&self) -> Result<String> {
        let command = self.resolve_command("dump", &[])?;
        let result = self.executor.run_unchecked("sh", &["-c", &command])?;
        if !result.success {
            return Err(ManagerError::CommandFailed {
                manager: self.name.clone(),
                operation: "dump".to_string(),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(result.stdout)
    }

    fn ensure(&self) -> Result<()> {
        self.run_attached("ensure")
    }

    fn update(&self) -> Result<()> {
        self.run_attached("update")
    }
}
