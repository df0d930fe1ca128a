//! Symlink value types and the reconciliation engine.
//!
//! A [`Symlink`] pairs a canonical file inside the dotfiles store (the
//! *target*) with the place it must appear as a symbolic link (the *link*).
//! [`LinkManager`] converges the filesystem towards that pair.
mod manager;

pub use manager::LinkManager;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A `(target, link)` pair.
///
/// When reconciled, `link` is a symbolic link whose referent is exactly
/// `target`.  Values are never patched in place; reconciliation always
/// re-derives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symlink {
    /// Canonical location of the file inside the dotfiles directory.
    pub target: PathBuf,
    /// Location where the file must appear as a symlink.
    pub link: PathBuf,
}

impl Symlink {
    /// Create a symlink from explicit paths.
    #[must_use]
    pub fn new(target: impl Into<PathBuf>, link: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            link: link.into(),
        }
    }
}

impl fmt::Display for Symlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.link.display(), self.target.display())
    }
}

/// Current state of a symlink on disk, as seen by [`LinkManager::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// `link` is a symlink whose referent is exactly `target`.
    Linked,
    /// Something exists at `link` but nothing at `target`: adopt it.
    Adoptable,
    /// `target` exists; the link needs to be created.
    Unlinked,
    /// Neither side exists.
    Missing,
}

/// Result of [`LinkManager::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    /// Nothing to do; the link was already in place.
    AlreadyLinked,
    /// The link was created pointing at an existing target.
    Linked,
    /// The file at `link` was moved to `target` and replaced by a link.
    Adopted,
}

/// The set of symlinks a manager owns, stored as a `link = target` table.
///
/// Keyed by link, so no two records can share the same link location.
///
/// # Examples
///
/// ```
/// use punkt::symlink::{Symlink, SymlinkConfig};
///
/// let mut config = SymlinkConfig::default();
/// assert!(config.insert(Symlink::new("~/.dotfiles/.vimrc", "~/.vimrc")));
/// assert!(!config.insert(Symlink::new("~/.dotfiles/.vimrc", "~/.vimrc")));
/// assert_eq!(config.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymlinkConfig {
    links: BTreeMap<PathBuf, PathBuf>,
}

impl SymlinkConfig {
    /// Number of recorded symlinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if no symlinks are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// All recorded symlinks, ordered by link.
    #[must_use]
    pub fn symlinks(&self) -> Vec<Symlink> {
        self.links
            .iter()
            .map(|(link, target)| Symlink::new(target.clone(), link.clone()))
            .collect()
    }

    /// Returns `true` if exactly this `(target, link)` pair is recorded.
    #[must_use]
    pub fn contains(&self, symlink: &Symlink) -> bool {
        self.links.get(&symlink.link) == Some(&symlink.target)
    }

    /// Record `symlink`.  Returns `false` if the identical pair was already
    /// present.  A record for the same link with a different target is
    /// replaced.
    pub fn insert(&mut self, symlink: Symlink) -> bool {
        if self.contains(&symlink) {
            return false;
        }
        self.links.insert(symlink.link, symlink.target);
        true
    }

    /// Delete the record matching `symlink` exactly.  Returns `false` if no
    /// such record exists.
    pub fn remove(&mut self, symlink: &Symlink) -> bool {
        if !self.contains(symlink) {
            return false;
        }
        self.links.remove(&symlink.link);
        true
    }

    /// Look up the recorded target for `link`.
    #[must_use]
    pub fn target_of(&self, link: &Path) -> Option<&Path> {
        self.links.get(link).map(PathBuf::as_path)
    }
}

impl FromIterator<Symlink> for SymlinkConfig {
    fn from_iter<I: IntoIterator<Item = Symlink>>(iter: I) -> Self {
        let mut config = Self::default();
        for symlink in iter {
            config.insert(symlink);
        }
        config
    }
}
