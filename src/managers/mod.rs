//! Managers: named units that can dump, ensure and update one facility.
//!
//! The built-in managers are [`SymlinkManager`] and [`GitManager`]; every
//! entry in the configured command table becomes a [`GenericManager`].
//! [`RootManager`] drives a list of them and reconciles the symlinks each
//! one declares in its `<name>.toml`.
mod generic;
mod git;
mod root;
mod symlink;

pub use generic::GenericManager;
pub use git::{GitConfig, GitManager, Repository};
pub use root::{RootManager, RunReport};
pub use symlink::SymlinkManager;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::symlink::SymlinkConfig;

/// Per-manager persisted configuration, as far as the orchestrator cares.
///
/// Other keys in the file belong to the manager itself and are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Symlinks the manager wants reconciled on `ensure`.
    #[serde(default)]
    pub symlinks: SymlinkConfig,
}

/// A unit that can capture and restore the state of one facility.
#[cfg_attr(test, mockall::automock)]
pub trait Manager {
    /// Stable name; also the stem of the manager's config file.
    fn name(&self) -> &str;

    /// Capture the live state as configuration text.  Must not modify the
    /// live system.  Empty text means "nothing to persist".
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read.
    fn dump(&self) -> Result<String>;

    /// Converge the live system to the persisted configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the live system cannot be converged.
    fn ensure(&self) -> Result<()>;

    /// Bring the live system to a newer state.
    ///
    /// # Errors
    ///
    /// Returns an error if updating fails.
    fn update(&self) -> Result<()>;
}

/// Every concrete manager the tool knows how to build.
#[derive(Debug)]
pub enum ManagerKind {
    /// A command-table driven external tool.
    Generic(GenericManager),
    /// Git repositories and global git config files.
    Git(GitManager),
    /// User-added symlinks.
    Symlink(SymlinkManager),
}

impl ManagerKind {
    fn inner(&self) -> &dyn Manager {
        match self {
            Self::Generic(m) => m,
            Self::Git(m) => m,
            Self::Symlink(m) => m,
        }
    }
}

impl Manager for ManagerKind {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn dump(&self) -> Result<String> {
        self.inner().dump()
    }

    fn ensure(&self) -> Result<()> {
        self.inner().ensure()
    }

    fn update(&self) -> Result<()> {
        self.inner().update()
    }
}
