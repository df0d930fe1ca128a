//! The user-facing symlink manager: `add symlink` and `remove symlink`.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Manager, ManagerConfig};
use crate::config::store;
use crate::operations::FileSystemOps;
use crate::path::{absolute, as_absolute};
use crate::symlink::{LinkManager, Symlink};

/// Records symlinks the user added by hand in `symlink.toml`.
///
/// Dump, ensure and update are no-ops: the recorded symlinks are reconciled
/// by [`RootManager`](super::RootManager) like any other manager's.
#[derive(Debug, Clone)]
pub struct SymlinkManager {
    link_manager: LinkManager,
    fs: Arc<dyn FileSystemOps>,
    working_dir: PathBuf,
    config_file: PathBuf,
}

impl SymlinkManager {
    /// Name of the manager and stem of its config file.
    pub const NAME: &'static str = "symlink";

    /// Create a symlink manager persisting to `config_file`.
    #[must_use]
    pub fn new(
        link_manager: LinkManager,
        fs: Arc<dyn FileSystemOps>,
        working_dir: PathBuf,
        config_file: PathBuf,
    ) -> Self {
        Self {
            link_manager,
            fs,
            working_dir,
            config_file,
        }
    }

    /// Adopt `target` and record it.
    ///
    /// `target` is the existing file to manage; `new_location` is where its
    /// canonical copy should live, derived into the dotfiles directory when
    /// not given.  The link is ensured before anything is recorded, so a
    /// failure leaves the record untouched.  Returns the stored (`~`) form.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` does not exist, the symlink cannot be
    /// ensured, or the record cannot be read or written.
    pub fn add(&self, target: &Path, new_location: Option<&Path>) -> Result<Symlink> {
        let home = self.link_manager.home();
        let abs_target = as_absolute(self.fs.as_ref(), &self.working_dir, home, target)?;
        let new_location = new_location.map(|p| absolute(&self.working_dir, home, p));

        let symlink = self
            .link_manager
            .symlink(new_location.as_deref(), Some(abs_target.as_path()));
        self.link_manager
            .ensure(&symlink)
            .with_context(|| format!("failed to ensure {symlink} exists"))?;

        let stored = self.link_manager.unexpand(&symlink);
        let mut config = self.read()?;
        if config.symlinks.insert(stored.clone()) {
            tracing::debug!(symlink = %stored, "storing symlink in configuration");
            store::save_toml(self.fs.as_ref(), &config, &self.config_file)?;
        } else {
            tracing::info!(symlink = %stored, "symlink is already stored");
        }
        Ok(stored)
    }

    /// Undo the adoption of `link` and drop its record.
    ///
    /// A missing record, or a missing config file, is tolerated: removing
    /// the link from disk is what matters.  Returns the stored (`~`) form of
    /// the removed symlink and whether a record was dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `link` does not exist or is not a symlink, the
    /// file cannot be moved back, or the record cannot be read or written.
    pub fn remove(&self, link: &Path) -> Result<(Symlink, bool)> {
        let abs_link = as_absolute(
            self.fs.as_ref(),
            &self.working_dir,
            self.link_manager.home(),
            link,
        )?;
        let removed = self
            .link_manager
            .remove(&abs_link)
            .with_context(|| format!("failed to remove link {}", link.display()))?;

        let stored = self.link_manager.unexpand(&removed);
        let mut config = self.read()?;
        if !config.symlinks.remove(&stored) {
            tracing::warn!(symlink = %stored, "symlink not found in configuration, nothing to remove");
            return Ok((stored, false));
        }
        store::save_toml(self.fs.as_ref(), &config, &self.config_file)?;
        Ok((stored, true))
    }

    fn read(&self) -> Result<ManagerConfig> {
        let config: Option<ManagerConfig> = store::read_toml(self.fs.as_ref(), &self.config_file)?;
        Ok(config.unwrap_or_default())
    }
}

impl Manager for SymlinkManager {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dump(&self) -> Result<String> {
        Ok(String::new())
    }

    fn ensure(&self) -> Result<()> {
        Ok(())
    }

    fn update(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::{LinkError, PathError};
    use crate::operations::MemoryFileSystem;

    const CONFIG: &str = "/home/.config/punkt/symlink.toml";

    fn setup(fs: MemoryFileSystem) -> (SymlinkManager, Arc<MemoryFileSystem>) {
        let fs = Arc::new(fs.with_dir("/home/.dotfiles"));
        let link_manager = LinkManager::new(
            fs.clone(),
            PathBuf::from("/home"),
            PathBuf::from("/home/.dotfiles"),
        );
        let mgr = SymlinkManager::new(
            link_manager,
            fs.clone(),
            PathBuf::from("/home"),
            PathBuf::from(CONFIG),
        );
        (mgr, fs)
    }

    fn recorded(fs: &MemoryFileSystem) -> Vec<Symlink> {
        store::read_toml::<ManagerConfig>(fs, Path::new(CONFIG))
            .unwrap()
            .unwrap_or_default()
            .symlinks
            .symlinks()
    }

    #[test]
    fn add_adopts_and_records() {
        let (mgr, fs) = setup(MemoryFileSystem::new().with_file("/home/.vimrc", "set number"));

        let stored = mgr.add(Path::new("/home/.vimrc"), None).unwrap();

        assert_eq!(stored, Symlink::new("~/.dotfiles/.vimrc", "~/.vimrc"));
        assert_eq!(
            fs.read_link(Path::new("/home/.vimrc")).unwrap(),
            PathBuf::from("/home/.dotfiles/.vimrc")
        );
        assert_eq!(fs.contents("/home/.dotfiles/.vimrc").unwrap(), b"set number");
        assert_eq!(recorded(&fs), vec![stored]);
    }

    #[test]
    fn add_resolves_relative_target() {
        let (mgr, fs) = setup(MemoryFileSystem::new().with_file("/home/.bashrc", ""));
        mgr.add(Path::new(".bashrc"), None).unwrap();
        assert!(fs.is_symlink("/home/.bashrc"));
    }

    #[test]
    fn add_uses_explicit_location() {
        let (mgr, fs) = setup(MemoryFileSystem::new().with_file("/home/.vimrc", "x"));
        let stored = mgr
            .add(Path::new("~/.vimrc"), Some(Path::new("~/.dotfiles/vim/vimrc")))
            .unwrap();
        assert_eq!(stored, Symlink::new("~/.dotfiles/vim/vimrc", "~/.vimrc"));
        assert_eq!(fs.contents("/home/.dotfiles/vim/vimrc").unwrap(), b"x");
    }

    #[test]
    fn add_twice_records_once() {
        let (mgr, fs) = setup(MemoryFileSystem::new().with_file("/home/.vimrc", "x"));
        mgr.add(Path::new("/home/.vimrc"), None).unwrap();
        mgr.add(Path::new("/home/.vimrc"), None).unwrap();
        assert_eq!(recorded(&fs).len(), 1);
    }

    #[test]
    fn add_missing_target_fails_without_recording() {
        let (mgr, fs) = setup(MemoryFileSystem::new());
        let err = mgr.add(Path::new("/home/.vimrc"), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PathError>(),
            Some(PathError::NotFound(_))
        ));
        assert!(fs.contents(CONFIG).is_none());
    }

    #[test]
    fn add_outside_home_fails_without_recording() {
        let (mgr, fs) = setup(MemoryFileSystem::new().with_file("/etc/hosts", ""));
        let err = mgr.add(Path::new("/etc/hosts"), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::EmptyPath("target"))
        ));
        assert!(fs.contents(CONFIG).is_none());
        assert!(!fs.is_symlink("/etc/hosts"));
    }

    #[test]
    fn add_keeps_other_records() {
        let (mgr, fs) = setup(
            MemoryFileSystem::new()
                .with_file("/home/.zshrc", "")
                .with_file(CONFIG, "[symlinks]\n\"~/.vimrc\" = \"~/.dotfiles/.vimrc\"\n"),
        );
        mgr.add(Path::new("/home/.zshrc"), None).unwrap();
        assert_eq!(
            recorded(&fs),
            vec![
                Symlink::new("~/.dotfiles/.vimrc", "~/.vimrc"),
                Symlink::new("~/.dotfiles/.zshrc", "~/.zshrc"),
            ]
        );
    }

    #[test]
    fn remove_restores_file_and_drops_record() {
        let (mgr, fs) = setup(MemoryFileSystem::new().with_file("/home/.vimrc", "set number"));
        mgr.add(Path::new("/home/.vimrc"), None).unwrap();

        let (removed, dropped) = mgr.remove(Path::new("~/.vimrc")).unwrap();

        assert!(dropped);
        assert_eq!(removed, Symlink::new("~/.dotfiles/.vimrc", "~/.vimrc"));
        assert!(!fs.is_symlink("/home/.vimrc"));
        assert_eq!(fs.contents("/home/.vimrc").unwrap(), b"set number");
        assert!(recorded(&fs).is_empty());
    }

    #[test]
    fn remove_tolerates_missing_record() {
        let (mgr, fs) = setup(
            MemoryFileSystem::new()
                .with_file("/home/.dotfiles/.tmux.conf", "set -g mouse on")
                .with_symlink("/home/.tmux.conf", "/home/.dotfiles/.tmux.conf"),
        );
        let (_, dropped) = mgr.remove(Path::new("/home/.tmux.conf")).unwrap();
        assert!(!dropped);
        assert_eq!(fs.contents("/home/.tmux.conf").unwrap(), b"set -g mouse on");
        assert!(fs.contents(CONFIG).is_none());
    }

    #[test]
    fn remove_regular_file_fails() {
        let (mgr, _) = setup(MemoryFileSystem::new().with_file("/home/.vimrc", ""));
        assert!(mgr.remove(Path::new("/home/.vimrc")).is_err());
    }

    #[test]
    fn lifecycle_methods_are_no_ops() {
        let (mgr, _) = setup(MemoryFileSystem::new());
        assert_eq!(mgr.name(), "symlink");
        assert_eq!(mgr.dump().unwrap(), "");
        assert!(mgr.ensure().is_ok());
        assert!(mgr.update().is_ok());
    }
}
