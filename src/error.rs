//! Domain-specific error types for punkt.
//!
//! Internal modules return typed errors (e.g., [`LinkError`], [`ConfigError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! PathError     - a path cannot be expressed relative to the expected root
//! LinkError     - symlink reconciliation conflicts
//! ConfigError   - configuration loading, parsing and validation
//! ManagerError  - per-manager failures (git repositories, external commands)
//! RunError      - aggregate of every manager that failed during one run
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while deriving one path from another.
#[derive(Error, Debug)]
pub enum PathError {
    /// The path is not a descendant of the root it should be relative to.
    #[error("non-home relative target given without specific link location: {} is not under {}", path.display(), root.display())]
    NonHomeRelativeTarget {
        /// Path that was being derived.
        path: PathBuf,
        /// Root the path was expected to live under.
        root: PathBuf,
    },

    /// The path does not exist.
    #[error("file or directory does not exist: {}", .0.display())]
    NotFound(PathBuf),
}

/// Errors raised while reconciling a single symlink.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Neither the link nor the target exists, so there is nothing to adopt.
    #[error("neither {} nor {} exists, nothing to link", link.display(), target.display())]
    NothingToLink {
        /// Canonical location inside the dotfiles directory.
        target: PathBuf,
        /// Location the symlink should appear at.
        link: PathBuf,
    },

    /// The path given to `remove` is not a symbolic link.
    #[error("given link isn't a symlink: {}", .0.display())]
    NotASymlink(PathBuf),

    /// The symlink given to `remove` points at nothing, so there is no file
    /// to move back.
    #[error("{} points to {}, which does not exist", link.display(), target.display())]
    DanglingLink {
        /// The symlink that was asked to be removed.
        link: PathBuf,
        /// Where it points.
        target: PathBuf,
    },

    /// Something other than the expected symlink occupies the link location.
    #[error("{} already exists and does not link to {}", link.display(), target.display())]
    Occupied {
        /// Location the symlink should appear at.
        link: PathBuf,
        /// Canonical location inside the dotfiles directory.
        target: PathBuf,
    },

    /// One side of the symlink is empty, usually because derivation failed.
    #[error("symlink has an empty {0}")]
    EmptyPath(&'static str),
}

/// Errors that arise from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A TOML file exists but cannot be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A value cannot be serialized to TOML.
    #[error("failed to serialize {}: {message}", path.display())]
    Serialize {
        /// File that was being written.
        path: PathBuf,
        /// Serializer message.
        message: String,
    },

    /// An explicitly requested config file does not exist.
    #[error("given config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// An I/O error occurred while reading or writing a config file.
    #[error("IO error on config file {}: {source}", path.display())]
    Io {
        /// Path to the file that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A generic manager uses a name reserved for a built-in manager.
    #[error("manager name '{0}' is reserved for a built-in manager")]
    ReservedManagerName(String),

    /// A generic manager has neither an override nor a fallback `command`.
    #[error("manager '{manager}' has no command configured for '{operation}'")]
    MissingCommand {
        /// Manager name.
        manager: String,
        /// Operation that was requested.
        operation: String,
    },

    /// The user's home directory cannot be determined.
    #[error("cannot determine home directory: neither HOME nor USERPROFILE is set")]
    MissingHome,
}

/// Errors raised by individual managers.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// A repository path is not recorded in the git configuration.
    #[error("repository not found in config: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    /// A repository has no remote to record or clone from.
    #[error("git repository has no remotes: {}", .0.display())]
    NoRemote(PathBuf),

    /// One or more repositories failed during a batch operation.
    #[error("failed to {operation} the following repositories: {}", names.join(", "))]
    RepositoriesFailed {
        /// Operation that was attempted (`ensure`, `update`).
        operation: &'static str,
        /// Names of the repositories that failed.
        names: Vec<String>,
    },

    /// An external command exited non-zero.
    #[error("{manager} {operation} failed (exit {code}): {stderr}")]
    CommandFailed {
        /// Manager name.
        manager: String,
        /// Operation that was attempted.
        operation: String,
        /// Exit code, or -1 when killed by a signal.
        code: i32,
        /// Trimmed standard error output.
        stderr: String,
    },
}

/// A single failed item within a [`RunError`].
#[derive(Debug)]
pub struct Failure {
    /// Name of the manager the failure belongs to.
    pub manager: String,
    /// What went wrong.
    pub error: anyhow::Error,
}

/// Aggregate error returned when one or more managers failed during a run.
///
/// Every manager is attempted before this is returned; the list holds one
/// entry per failure in the order they happened.
#[derive(Debug)]
pub struct RunError {
    /// Operation that was run (`dump`, `ensure`, `update`).
    pub operation: &'static str,
    /// Every failure collected during the run.
    pub failures: Vec<Failure>,
}

impl RunError {
    /// Names of the managers that reported at least one failure, in order.
    #[must_use]
    pub fn managers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for failure in &self.failures {
            if !names.contains(&failure.manager.as_str()) {
                names.push(&failure.manager);
            }
        }
        names
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {} manager(s):",
            self.operation,
            self.managers().len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}: {:#}", failure.manager, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn non_home_relative_target_display() {
        let e = PathError::NonHomeRelativeTarget {
            path: PathBuf::from("/etc/hosts"),
            root: PathBuf::from("/home/user"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/etc/hosts"));
        assert!(msg.contains("/home/user"));
    }

    #[test]
    fn nothing_to_link_display() {
        let e = LinkError::NothingToLink {
            target: PathBuf::from("/dotfiles/.vimrc"),
            link: PathBuf::from("/home/.vimrc"),
        };
        assert_eq!(
            e.to_string(),
            "neither /home/.vimrc nor /dotfiles/.vimrc exists, nothing to link"
        );
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: PathBuf::from("/punkt/git.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/punkt/git.toml"));
    }

    #[test]
    fn repositories_failed_lists_names() {
        let e = ManagerError::RepositoriesFailed {
            operation: "update",
            names: vec!["punkt".to_string(), "dotfiles".to_string()],
        };
        assert_eq!(
            e.to_string(),
            "failed to update the following repositories: punkt, dotfiles"
        );
    }

    #[test]
    fn run_error_names_each_failed_manager_once() {
        let e = RunError {
            operation: "ensure",
            failures: vec![
                Failure {
                    manager: "git".to_string(),
                    error: anyhow::anyhow!("clone failed"),
                },
                Failure {
                    manager: "brew".to_string(),
                    error: anyhow::anyhow!("exit 1"),
                },
                Failure {
                    manager: "git".to_string(),
                    error: anyhow::anyhow!("symlink failed"),
                },
            ],
        };
        assert_eq!(e.managers(), vec!["git", "brew"]);
        let msg = e.to_string();
        assert!(msg.starts_with("ensure failed for 2 manager(s):"));
        assert!(msg.contains("git: clone failed"));
        assert!(msg.contains("brew: exit 1"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<PathError>();
        assert_send_sync::<LinkError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ManagerError>();
        assert_send_sync::<RunError>();
    }

    #[test]
    fn link_error_converts_to_anyhow() {
        let e = LinkError::NotASymlink(PathBuf::from("/home/.vimrc"));
        let _anyhow_err: anyhow::Error = e.into();
    }
}
