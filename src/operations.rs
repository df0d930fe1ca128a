//! Filesystem operation abstractions for dependency injection.
//!
//! Every path operation the symlink engine and the managers perform goes
//! through the [`FileSystemOps`] trait.  Production code uses
//! [`SystemFileSystemOps`]; tests use `MemoryFileSystem`, a fully
//! in-memory tree with real symlink semantics, built with the
//! `test-support` feature.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem calls made by punkt.
///
/// Methods named after their `std::fs` counterparts behave the same way:
/// [`exists`](Self::exists) and [`is_dir`](Self::is_dir) follow symlinks,
/// while [`entry_exists`](Self::entry_exists), [`read_link`](Self::read_link),
/// [`remove`](Self::remove) and [`rename`](Self::rename) act on the entry
/// itself.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists, following symlinks (like `stat`).
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if there is any entry at `path`, including a dangling
    /// symlink (like `lstat`).
    fn entry_exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` resolves to a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Read the target of the symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if `link` already exists or its parent is missing.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Move the entry at `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` does not exist or `to` cannot be written.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` and all of its missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if an ancestor exists but is not a directory.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove the file, symlink or empty directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Read the whole file at `path` as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Create or truncate the file at `path` and write `contents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory is missing or the file cannot
    /// be written.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Returns the immediate child paths inside `path`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn entry_exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, link)
        }

        #[cfg(windows)]
        {
            if target.is_dir() {
                std::os::windows::fs::symlink_dir(target, link)
            } else {
                std::os::windows::fs::symlink_file(target, link)
            }
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = std::fs::symlink_metadata(path)?;
        if meta.is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod memory;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryFileSystem;
