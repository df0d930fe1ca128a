//! In-memory [`FileSystemOps`] with real symlink semantics.
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use super::FileSystemOps;

/// Maximum number of symlinks followed while resolving a single path.
const MAX_LINK_HOPS: usize = 40;

/// A node in the [`MemoryFileSystem`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Dir,
    Symlink(PathBuf),
}

/// In-memory [`FileSystemOps`] used by tests.
///
/// Paths are absolute; the root directory always exists.  Symlinks are
/// resolved on lookup the same way the kernel would, so reconciliation logic
/// can be exercised end-to-end without touching the disk.
///
/// # Example
///
/// ```
/// use punkt::operations::{FileSystemOps, MemoryFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new()
///     .with_file("/home/.vimrc", "set number")
///     .with_dir("/home/.dotfiles");
///
/// assert!(fs.exists(Path::new("/home/.vimrc")));
/// assert!(fs.is_dir(Path::new("/home/.dotfiles")));
/// ```
#[derive(Debug)]
pub struct MemoryFileSystem {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Create a filesystem containing only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(root(), Node::Dir);
        Self {
            nodes: Mutex::new(nodes),
        }
    }

    /// Add a regular file (and its parent directories).
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            let _ = self.create_dir_all(parent);
        }
        let _ = self.write(path, contents.as_ref());
        self
    }

    /// Add a directory (and its parents).
    #[must_use]
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        let _ = self.create_dir_all(path.as_ref());
        self
    }

    /// Add a symlink at `link` pointing to `target` (parents of `link` are
    /// created; `target` need not exist).
    #[must_use]
    pub fn with_symlink(self, link: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        let link = link.as_ref();
        if let Some(parent) = link.parent() {
            let _ = self.create_dir_all(parent);
        }
        let _ = self.symlink(target.as_ref(), link);
        self
    }

    /// Return the raw bytes of the file at `path`, following symlinks.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let nodes = self.lock();
        let resolved = resolve(&nodes, path.as_ref(), true, 0).ok()?;
        match nodes.get(&resolved) {
            Some(Node::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Returns `true` if the entry at `path` itself is a symlink.
    #[must_use]
    pub fn is_symlink(&self, path: impl AsRef<Path>) -> bool {
        self.read_link(path.as_ref()).is_ok()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        self.nodes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn root() -> PathBuf {
    PathBuf::from(std::path::MAIN_SEPARATOR_STR)
}

/// Resolve `path` through any symlinks in its components.
///
/// When `follow_last` is `false` the final component is left as-is, giving
/// `lstat` semantics.  The returned path need not exist.
fn resolve(
    nodes: &BTreeMap<PathBuf, Node>,
    path: &Path,
    follow_last: bool,
    depth: usize,
) -> io::Result<PathBuf> {
    if depth > MAX_LINK_HOPS {
        return Err(io::Error::other("too many levels of symbolic links"));
    }

    let components: Vec<Component<'_>> = path.components().collect();
    let last = components.len().saturating_sub(1);
    let mut resolved = PathBuf::new();

    for (i, component) in components.iter().enumerate() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                resolved.pop();
                continue;
            }
            _ => resolved.push(component.as_os_str()),
        }
        if i == last && !follow_last {
            break;
        }
        if let Some(Node::Symlink(target)) = nodes.get(&resolved) {
            let base = resolved.parent().map(Path::to_path_buf).unwrap_or_else(root);
            resolved = resolve(nodes, &base.join(target), true, depth + 1)?;
        }
    }

    Ok(resolved)
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

/// Resolve the parent of `path` and make sure it is a directory; returns the
/// resolved location of the entry itself.
fn entry_location(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<PathBuf> {
    let location = resolve(nodes, path, false, 0)?;
    let parent = location.parent().map(Path::to_path_buf).unwrap_or_else(root);
    match nodes.get(&parent) {
        Some(Node::Dir) => Ok(location),
        Some(_) => Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("not a directory: {}", parent.display()),
        )),
        None => Err(not_found(&parent)),
    }
}

fn has_children(nodes: &BTreeMap<PathBuf, Node>, dir: &Path) -> bool {
    nodes
        .keys()
        .any(|k| k.parent() == Some(dir) && k.as_path() != dir)
}

impl FileSystemOps for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let nodes = self.lock();
        resolve(&nodes, path, true, 0).is_ok_and(|p| nodes.contains_key(&p))
    }

    fn entry_exists(&self, path: &Path) -> bool {
        let nodes = self.lock();
        resolve(&nodes, path, false, 0).is_ok_and(|p| nodes.contains_key(&p))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let nodes = self.lock();
        resolve(&nodes, path, true, 0).is_ok_and(|p| nodes.get(&p) == Some(&Node::Dir))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let nodes = self.lock();
        let location = resolve(&nodes, path, false, 0)?;
        match nodes.get(&location) {
            Some(Node::Symlink(target)) => Ok(target.clone()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a symlink: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let mut nodes = self.lock();
        let location = entry_location(&nodes, link)?;
        if nodes.contains_key(&location) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {}", link.display()),
            ));
        }
        nodes.insert(location, Node::Symlink(target.to_path_buf()));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut nodes = self.lock();
        let source = resolve(&nodes, from, false, 0)?;
        let Some(node) = nodes.get(&source).cloned() else {
            return Err(not_found(from));
        };
        let destination = entry_location(&nodes, to)?;
        if destination.starts_with(&source) && destination != source {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }
        match (nodes.get(&destination), &node) {
            (None, _) => {}
            (Some(Node::Dir), Node::Dir) if !has_children(&nodes, &destination) => {}
            (Some(Node::Dir), _) | (Some(_), Node::Dir) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("cannot overwrite {}", to.display()),
                ));
            }
            (Some(_), _) => {}
        }

        let moved: Vec<(PathBuf, Node)> = nodes
            .iter()
            .filter(|(k, _)| k.starts_with(&source))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, _) in &moved {
            nodes.remove(key);
        }
        for (key, value) in moved {
            let suffix = key.strip_prefix(&source).unwrap_or(Path::new(""));
            let new_key = if suffix.as_os_str().is_empty() {
                destination.clone()
            } else {
                destination.join(suffix)
            };
            nodes.insert(new_key, value);
        }
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.lock();
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component.as_os_str());
            let resolved = resolve(&nodes, &current, true, 0)?;
            match nodes.get(&resolved) {
                Some(Node::Dir) => {}
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("not a directory: {}", current.display()),
                    ));
                }
                None => {
                    nodes.insert(resolved, Node::Dir);
                }
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.lock();
        let location = resolve(&nodes, path, false, 0)?;
        match nodes.get(&location) {
            None => Err(not_found(path)),
            Some(Node::Dir) if has_children(&nodes, &location) => Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("directory not empty: {}", path.display()),
            )),
            Some(_) => {
                nodes.remove(&location);
                Ok(())
            }
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let nodes = self.lock();
        let resolved = resolve(&nodes, path, true, 0)?;
        match nodes.get(&resolved) {
            Some(Node::File(bytes)) => String::from_utf8(bytes.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut nodes = self.lock();
        let location = entry_location(&nodes, path)?;
        let location = match nodes.get(&location) {
            Some(Node::Symlink(_)) => resolve(&nodes, &location, true, 0)?,
            _ => location,
        };
        if nodes.get(&location) == Some(&Node::Dir) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            ));
        }
        nodes.insert(location, Node::File(contents.to_vec()));
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let nodes = self.lock();
        let resolved = resolve(&nodes, path, true, 0)?;
        match nodes.get(&resolved) {
            Some(Node::Dir) => Ok(nodes
                .keys()
                .filter(|k| k.parent() == Some(resolved.as_path()) && **k != resolved)
                .filter_map(|k| k.file_name().map(|name| path.join(name)))
                .collect()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }
}
