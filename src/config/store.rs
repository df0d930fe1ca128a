//! Reading and writing the per-manager TOML files under punkt home.
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::Path;

use crate::error::ConfigError;
use crate::operations::FileSystemOps;

/// Read and deserialize a TOML file.
///
/// A missing file is not an error: it yields `Ok(None)` so callers can treat
/// it as "nothing recorded yet".
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the file exists but is not valid TOML
/// for `T`, or [`ConfigError::Io`] if it cannot be read.
pub fn read_toml<T: DeserializeOwned>(
    fs: &dyn FileSystemOps,
    path: &Path,
) -> Result<Option<T>, ConfigError> {
    let content = match fs.read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no such file, using empty config");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
}

/// Serialize `value` as TOML and fully rewrite `path` with it.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Serialize`] if `value` cannot be represented as
/// TOML, or [`ConfigError::Io`] if the file cannot be written.
pub fn save_toml<T: Serialize>(
    fs: &dyn FileSystemOps,
    value: &T,
    path: &Path,
) -> Result<(), ConfigError> {
    let content = toml::to_string(value).map_err(|e| ConfigError::Serialize {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write(fs, &content, path)
}

/// Write dumped text verbatim to `path`.
///
/// Empty text writes nothing and leaves an existing file untouched; the
/// return value tells whether the file was written.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be written.
pub fn save(fs: &dyn FileSystemOps, content: &str, path: &Path) -> Result<bool, ConfigError> {
    if content.is_empty() {
        tracing::debug!(path = %path.display(), "empty content, not saving");
        return Ok(false);
    }
    write(fs, content, path)?;
    Ok(true)
}

fn write(fs: &dyn FileSystemOps, content: &str, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent).map_err(io_err)?;
    }
    fs.write(path, content.as_bytes()).map_err(io_err)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "saved file");
    Ok(())
}
