//! Path derivation between the home and dotfiles roots.
//!
//! Everything here is pure except [`as_absolute`], which takes the
//! filesystem seam to check existence.  Stored configuration always uses the
//! portable `~` form; in-memory paths are always absolute.
use std::path::{Component, Path, PathBuf};

use crate::error::PathError;
use crate::operations::FileSystemOps;

/// The marker used in stored paths in place of the user's home directory.
pub const HOME_MARKER: &str = "~";

/// Lexically clean `path`: drop `.` components and fold `..` into their
/// parent.  No filesystem access; symlinks are not consulted.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Map `path`, which must live under `source_root`, to the equivalent
/// location under `dest_root`.
///
/// # Errors
///
/// Returns [`PathError::NonHomeRelativeTarget`] if `path` is not a
/// descendant of `source_root`.
///
/// # Examples
///
/// ```
/// use punkt::path::derive_link;
/// use std::path::{Path, PathBuf};
///
/// let link = derive_link(
///     Path::new("/home/.dotfiles/.config/git/ignore"),
///     Path::new("/home/.dotfiles"),
///     Path::new("/home"),
/// )
/// .unwrap();
/// assert_eq!(link, PathBuf::from("/home/.config/git/ignore"));
///
/// assert!(derive_link(Path::new("/etc/hosts"), Path::new("/home"), Path::new("/d")).is_err());
/// ```
pub fn derive_link(path: &Path, source_root: &Path, dest_root: &Path) -> Result<PathBuf, PathError> {
    let path = normalize(path);
    let source_root = normalize(source_root);
    let relative = path
        .strip_prefix(&source_root)
        .map_err(|_| PathError::NonHomeRelativeTarget {
            path: path.clone(),
            root: source_root.clone(),
        })?;

    if relative.as_os_str().is_empty() {
        Ok(dest_root.to_path_buf())
    } else {
        Ok(dest_root.join(relative))
    }
}

/// Replace a leading `~` in `path` with `home`.
///
/// Only a `~` that forms the whole first component is expanded, so
/// `~user/...` and paths containing `~` elsewhere are left untouched.
#[must_use]
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == HOME_MARKER => {
            let rest = components.as_path();
            if rest.as_os_str().is_empty() {
                home.to_path_buf()
            } else {
                home.join(rest)
            }
        }
        _ => path.to_path_buf(),
    }
}

/// Replace a leading `home` prefix in `path` with `~`.
///
/// The inverse of [`expand_home`] for any path under `home`; paths outside
/// `home` are returned unchanged.
#[must_use]
pub fn unexpand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => PathBuf::from(HOME_MARKER),
        Ok(rest) => Path::new(HOME_MARKER).join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Make `path` absolute against `working_dir`, expanding a leading `~` and
/// normalizing the result.  Nothing is checked on disk.
#[must_use]
pub fn absolute(working_dir: &Path, home: &Path, path: &Path) -> PathBuf {
    let expanded = expand_home(path, home);
    if expanded.is_absolute() {
        normalize(&expanded)
    } else {
        normalize(&working_dir.join(expanded))
    }
}

/// Like [`absolute`], but also
/// check that something exists there.
///
/// A dangling symlink counts as existing, since it is still an entry that
/// can be inspected and removed.
///
/// # Errors
///
/// Returns [`PathError::NotFound`] if nothing exists at the resolved path.
pub fn as_absolute(
    fs: &dyn FileSystemOps,
    working_dir: &Path,
    home: &Path,
    path: &Path,
) -> Result<PathBuf, PathError> {
    let absolute = absolute(working_dir, home, path);
    if fs.entry_exists(&absolute) {
        Ok(absolute)
    } else {
        Err(PathError::NotFound(absolute))
    }
}
