//! The symlink reconciliation algorithm.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{LinkChange, LinkState, Symlink};
use crate::error::LinkError;
use crate::operations::FileSystemOps;
use crate::path::{derive_link, expand_home, unexpand_home};

/// Owns the filesystem reconciliation of [`Symlink`]s between the home and
/// dotfiles directories.
#[derive(Debug, Clone)]
pub struct LinkManager {
    fs: Arc<dyn FileSystemOps>,
    home: PathBuf,
    dotfiles: PathBuf,
}

impl LinkManager {
    /// Create a link manager working between `home` and `dotfiles`.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystemOps>, home: PathBuf, dotfiles: PathBuf) -> Self {
        Self { fs, home, dotfiles }
    }

    /// The user's home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The dotfiles directory.
    #[must_use]
    pub fn dotfiles(&self) -> &Path {
        &self.dotfiles
    }

    /// Build a [`Symlink`], deriving whichever side is missing.
    ///
    /// A missing link is derived by mapping `target` from the dotfiles
    /// directory into home; a missing target by mapping `link` from home
    /// into the dotfiles directory.  Derivation failures leave the field
    /// empty: [`ensure`](Self::ensure) rejects such a symlink.
    #[must_use]
    pub fn symlink(&self, target: Option<&Path>, link: Option<&Path>) -> Symlink {
        tracing::debug!(?target, ?link, "new symlink");
        match (target, link) {
            (Some(target), Some(link)) => Symlink::new(target, link),
            (Some(target), None) => {
                let link = derive_link(target, &self.dotfiles, &self.home).unwrap_or_else(|e| {
                    tracing::debug!("unable to derive link: {e}");
                    PathBuf::new()
                });
                Symlink::new(target, link)
            }
            (None, Some(link)) => {
                let target = derive_link(link, &self.home, &self.dotfiles).unwrap_or_else(|e| {
                    tracing::debug!("unable to derive target: {e}");
                    PathBuf::new()
                });
                Symlink::new(target, link)
            }
            (None, None) => Symlink::new(PathBuf::new(), PathBuf::new()),
        }
    }

    /// Inspect the filesystem and classify `symlink`.
    #[must_use]
    pub fn state(&self, symlink: &Symlink) -> LinkState {
        if self
            .fs
            .read_link(&symlink.link)
            .is_ok_and(|existing| existing == symlink.target)
        {
            return LinkState::Linked;
        }

        let link_exists = self.fs.exists(&symlink.link);
        let target_exists = self.fs.exists(&symlink.target);
        tracing::debug!(
            link = %symlink.link.display(),
            target = %symlink.target.display(),
            link_exists,
            target_exists,
            "status of symlink"
        );

        match (link_exists, target_exists) {
            (true, false) => LinkState::Adoptable,
            (false, false) => LinkState::Missing,
            (_, true) => LinkState::Unlinked,
        }
    }

    /// Converge the filesystem so that `symlink.link` links to
    /// `symlink.target`.
    ///
    /// Already-linked symlinks are left untouched, which makes this safe to
    /// run repeatedly.  If a file exists at the link but not at the target it
    /// is adopted: moved into the dotfiles directory and replaced with a link.
    ///
    /// # Errors
    ///
    /// Returns an error if either path is empty, neither side exists, the
    /// link location is occupied by something else, or a filesystem call
    /// fails.  A failed adoption move never leaves a symlink behind.
    pub fn ensure(&self, symlink: &Symlink) -> Result<LinkChange> {
        if symlink.link.as_os_str().is_empty() {
            return Err(LinkError::EmptyPath("link").into());
        }
        if symlink.target.as_os_str().is_empty() {
            return Err(LinkError::EmptyPath("target").into());
        }

        match self.state(symlink) {
            LinkState::Linked => {
                tracing::info!("symlink exists: {}", self.unexpand(symlink));
                Ok(LinkChange::AlreadyLinked)
            }
            LinkState::Missing => Err(LinkError::NothingToLink {
                target: symlink.target.clone(),
                link: symlink.link.clone(),
            }
            .into()),
            LinkState::Adoptable => {
                tracing::debug!("link exists but target doesn't, moving link -> target");
                self.create_parent(&symlink.target)?;
                self.fs
                    .rename(&symlink.link, &symlink.target)
                    .with_context(|| {
                        format!(
                            "failed to rename {} to {}",
                            symlink.link.display(),
                            symlink.target.display()
                        )
                    })?;
                self.create_link(symlink)?;
                Ok(LinkChange::Adopted)
            }
            LinkState::Unlinked => {
                self.create_link(symlink)?;
                Ok(LinkChange::Linked)
            }
        }
    }

    /// Undo an adoption: delete the symlink at `link` and move the file it
    /// pointed to back into its place.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotASymlink`] if `link` is not a symbolic link,
    /// [`LinkError::DanglingLink`] if it points at nothing, or an error if
    /// removing the link or moving the file back fails.  The link is left in
    /// place whenever there is nothing to move back.
    pub fn remove(&self, link: &Path) -> Result<Symlink> {
        let target = self
            .fs
            .read_link(link)
            .map_err(|_| LinkError::NotASymlink(link.to_path_buf()))?;
        let target = if target.is_relative() {
            link.parent().map_or_else(|| target.clone(), |p| p.join(&target))
        } else {
            target
        };
        if !self.fs.entry_exists(&target) {
            return Err(LinkError::DanglingLink {
                link: link.to_path_buf(),
                target,
            }
            .into());
        }

        self.fs
            .remove(link)
            .with_context(|| format!("failed to remove {}", link.display()))?;
        self.fs.rename(&target, link).with_context(|| {
            format!(
                "failed to move {} to {} location",
                target.display(),
                link.display()
            )
        })?;

        tracing::info!(link = %link.display(), target = %target.display(), "symlink removed");
        Ok(Symlink::new(target, link))
    }

    /// Replace a leading `~` in both paths with the home directory.
    #[must_use]
    pub fn expand(&self, symlink: &Symlink) -> Symlink {
        Symlink::new(
            expand_home(&symlink.target, &self.home),
            expand_home(&symlink.link, &self.home),
        )
    }

    /// Replace the home directory prefix in both paths with `~`.
    #[must_use]
    pub fn unexpand(&self, symlink: &Symlink) -> Symlink {
        Symlink::new(
            unexpand_home(&symlink.target, &self.home),
            unexpand_home(&symlink.link, &self.home),
        )
    }

    fn create_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.fs
                .create_dir_all(parent)
                .with_context(|| format!("unable to create directories {}", parent.display()))?;
        }
        Ok(())
    }

    fn create_link(&self, symlink: &Symlink) -> Result<()> {
        self.create_parent(&symlink.link)?;
        if self.fs.entry_exists(&symlink.link) {
            return Err(LinkError::Occupied {
                link: symlink.link.clone(),
                target: symlink.target.clone(),
            }
            .into());
        }

        tracing::info!("creating symlink: {}", self.unexpand(symlink));
        self.fs
            .symlink(&symlink.target, &symlink.link)
            .with_context(|| format!("failed to create symlink {symlink}"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::MemoryFileSystem;

    const HOME: &str = "/home";
    const DOTFILES: &str = "/home/.dotfiles";

    fn manager(fs: MemoryFileSystem) -> (LinkManager, Arc<MemoryFileSystem>) {
        let fs = Arc::new(fs.with_dir(DOTFILES));
        let mgr = LinkManager::new(fs.clone(), PathBuf::from(HOME), PathBuf::from(DOTFILES));
        (mgr, fs)
    }

    #[test]
    fn symlink_keeps_both_given_paths() {
        let (mgr, _) = manager(MemoryFileSystem::new());
        let s = mgr.symlink(Some(Path::new("/elsewhere/a")), Some(Path::new("/tmp/b")));
        assert_eq!(s, Symlink::new("/elsewhere/a", "/tmp/b"));
    }

    #[test]
    fn symlink_derives_link_from_target() {
        let (mgr, _) = manager(MemoryFileSystem::new());
        let s = mgr.symlink(Some(Path::new("/home/.dotfiles/.config/git/ignore")), None);
        assert_eq!(s.link, PathBuf::from("/home/.config/git/ignore"));
    }

    #[test]
    fn symlink_derives_target_from_link() {
        let (mgr, _) = manager(MemoryFileSystem::new());
        let s = mgr.symlink(None, Some(Path::new("/home/.vimrc")));
        assert_eq!(s.target, PathBuf::from("/home/.dotfiles/.vimrc"));
    }

    #[test]
    fn symlink_swallows_derivation_failure() {
        let (mgr, _) = manager(MemoryFileSystem::new());
        let s = mgr.symlink(None, Some(Path::new("/etc/hosts")));
        assert!(s.target.as_os_str().is_empty());
        let err = mgr.ensure(&s).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::EmptyPath("target"))
        ));
    }

    #[test]
    fn ensure_adopts_existing_file() {
        let (mgr, fs) = manager(MemoryFileSystem::new().with_file("/home/.vimrc", "set number\n"));
        let s = Symlink::new("/home/.dotfiles/.vimrc", "/home/.vimrc");

        assert_eq!(mgr.state(&s), LinkState::Adoptable);
        assert_eq!(mgr.ensure(&s).unwrap(), LinkChange::Adopted);

        assert_eq!(
            fs.read_link(Path::new("/home/.vimrc")).unwrap(),
            PathBuf::from("/home/.dotfiles/.vimrc")
        );
        assert_eq!(
            fs.contents("/home/.dotfiles/.vimrc").unwrap(),
            b"set number\n"
        );
        assert!(!fs.is_symlink("/home/.dotfiles/.vimrc"));
    }

    #[test]
    fn ensure_adoption_creates_target_parents() {
        let (mgr, fs) =
            manager(MemoryFileSystem::new().with_file("/home/.config/git/ignore", "*.swp"));
        let s = mgr.symlink(None, Some(Path::new("/home/.config/git/ignore")));
        mgr.ensure(&s).unwrap();
        assert!(fs.is_dir(Path::new("/home/.dotfiles/.config/git")));
        assert_eq!(fs.contents("/home/.config/git/ignore").unwrap(), b"*.swp");
    }

    #[test]
    fn ensure_adopts_directory() {
        let (mgr, fs) = manager(
            MemoryFileSystem::new()
                .with_file("/home/.config/nvim/init.lua", "-- init")
                .with_file("/home/.config/nvim/lua/a.lua", "-- a"),
        );
        let s = mgr.symlink(None, Some(Path::new("/home/.config/nvim")));
        assert_eq!(mgr.ensure(&s).unwrap(), LinkChange::Adopted);
        assert!(fs.is_symlink("/home/.config/nvim"));
        assert_eq!(
            fs.contents("/home/.dotfiles/.config/nvim/lua/a.lua").unwrap(),
            b"-- a"
        );
    }

    #[test]
    fn ensure_links_existing_target() {
        let (mgr, fs) = manager(MemoryFileSystem::new().with_file("/home/.dotfiles/.zshrc", ""));
        let s = Symlink::new("/home/.dotfiles/.zshrc", "/home/.zshrc");

        assert_eq!(mgr.ensure(&s).unwrap(), LinkChange::Linked);
        assert!(fs.is_symlink("/home/.zshrc"));
    }

    #[test]
    fn ensure_creates_link_parents() {
        let (mgr, fs) =
            manager(MemoryFileSystem::new().with_file("/home/.dotfiles/.config/kitty.conf", ""));
        let s = mgr.symlink(Some(Path::new("/home/.dotfiles/.config/kitty.conf")), None);
        mgr.ensure(&s).unwrap();
        assert!(fs.is_symlink("/home/.config/kitty.conf"));
    }

    #[test]
    fn ensure_is_idempotent() {
        let (mgr, fs) = manager(MemoryFileSystem::new().with_file("/home/.vimrc", "x"));
        let s = Symlink::new("/home/.dotfiles/.vimrc", "/home/.vimrc");

        assert_eq!(mgr.ensure(&s).unwrap(), LinkChange::Adopted);
        let before = fs.read_dir(Path::new("/home")).unwrap();
        assert_eq!(mgr.ensure(&s).unwrap(), LinkChange::AlreadyLinked);
        assert_eq!(mgr.ensure(&s).unwrap(), LinkChange::AlreadyLinked);
        assert_eq!(fs.read_dir(Path::new("/home")).unwrap(), before);
        assert_eq!(fs.contents("/home/.dotfiles/.vimrc").unwrap(), b"x");
    }

    #[test]
    fn ensure_fails_when_nothing_exists() {
        let (mgr, fs) = manager(MemoryFileSystem::new());
        let s = Symlink::new("/home/.dotfiles/.vimrc", "/home/.vimrc");

        let err = mgr.ensure(&s).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::NothingToLink { .. })
        ));
        assert!(!fs.entry_exists(Path::new("/home/.vimrc")));
    }

    #[test]
    fn ensure_surfaces_conflict_instead_of_overwriting() {
        let (mgr, fs) = manager(
            MemoryFileSystem::new()
                .with_file("/home/.vimrc", "local")
                .with_file("/home/.dotfiles/.vimrc", "stored"),
        );
        let s = Symlink::new("/home/.dotfiles/.vimrc", "/home/.vimrc");

        let err = mgr.ensure(&s).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::Occupied { .. })
        ));
        assert_eq!(fs.contents("/home/.vimrc").unwrap(), b"local");
    }

    #[test]
    fn ensure_treats_equivalent_referent_as_conflict() {
        let (mgr, _) = manager(
            MemoryFileSystem::new()
                .with_file("/home/.dotfiles/.vimrc", "")
                .with_symlink("/home/.vimrc", ".dotfiles/.vimrc"),
        );
        let s = Symlink::new("/home/.dotfiles/.vimrc", "/home/.vimrc");
        assert_eq!(mgr.state(&s), LinkState::Unlinked);
        assert!(mgr.ensure(&s).is_err());
    }

    #[test]
    fn ensure_does_not_link_when_adoption_move_fails() {
        // The target's parent is a regular file, so the move cannot happen.
        let (mgr, fs) = manager(
            MemoryFileSystem::new()
                .with_file("/home/.vimrc", "x")
                .with_file("/home/.dotfiles/blocked", ""),
        );
        let s = Symlink::new("/home/.dotfiles/blocked/.vimrc", "/home/.vimrc");

        assert!(mgr.ensure(&s).is_err());
        assert!(!fs.is_symlink("/home/.vimrc"));
        assert_eq!(fs.contents("/home/.vimrc").unwrap(), b"x");
    }

    #[test]
    fn remove_restores_file() {
        let (mgr, fs) = manager(MemoryFileSystem::new().with_file("/home/.vimrc", "set number"));
        let s = Symlink::new("/home/.dotfiles/.vimrc", "/home/.vimrc");
        mgr.ensure(&s).unwrap();

        let removed = mgr.remove(Path::new("/home/.vimrc")).unwrap();
        assert_eq!(removed, s);
        assert!(!fs.is_symlink("/home/.vimrc"));
        assert_eq!(fs.contents("/home/.vimrc").unwrap(), b"set number");
        assert!(!fs.exists(Path::new("/home/.dotfiles/.vimrc")));
    }

    #[test]
    fn remove_resolves_relative_link_target() {
        let (mgr, fs) = manager(
            MemoryFileSystem::new()
                .with_file("/home/.dotfiles/.bashrc", "alias ll='ls -l'")
                .with_symlink("/home/.bashrc", ".dotfiles/.bashrc"),
        );
        let removed = mgr.remove(Path::new("/home/.bashrc")).unwrap();
        assert_eq!(removed.target, PathBuf::from("/home/.dotfiles/.bashrc"));
        assert_eq!(fs.contents("/home/.bashrc").unwrap(), b"alias ll='ls -l'");
    }

    #[test]
    fn remove_rejects_regular_file() {
        let (mgr, fs) = manager(MemoryFileSystem::new().with_file("/home/.vimrc", "x"));
        let err = mgr.remove(Path::new("/home/.vimrc")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::NotASymlink(_))
        ));
        assert!(fs.exists(Path::new("/home/.vimrc")));
    }

    #[test]
    fn remove_keeps_dangling_link() {
        let (mgr, fs) = manager(
            MemoryFileSystem::new().with_symlink("/home/.vimrc", "/home/.dotfiles/.vimrc"),
        );
        let err = mgr.remove(Path::new("/home/.vimrc")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::DanglingLink { .. })
        ));
        assert!(fs.is_symlink("/home/.vimrc"));
        assert_eq!(
            fs.read_link(Path::new("/home/.vimrc")).unwrap(),
            PathBuf::from("/home/.dotfiles/.vimrc")
        );
    }

    #[test]
    fn expand_and_unexpand_touch_both_fields() {
        let (mgr, _) = manager(MemoryFileSystem::new());
        let stored = Symlink::new("~/.dotfiles/.vimrc", "~/.vimrc");
        let expanded = mgr.expand(&stored);
        assert_eq!(expanded, Symlink::new("/home/.dotfiles/.vimrc", "/home/.vimrc"));
        assert_eq!(mgr.unexpand(&expanded), stored);
    }
}
