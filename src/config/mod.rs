//! Root configuration: where punkt keeps its state, where the dotfiles live
//! and which generic package managers exist.
pub mod store;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::operations::FileSystemOps;
use crate::path::absolute;

/// Manager names that belong to the built-in managers.
pub const RESERVED_MANAGER_NAMES: &[&str] = &["git", "symlink"];

/// File, relative to punkt home, declaring additional generic managers.
pub const MANAGERS_FILE: &str = "managers.toml";

/// Name of the log file written inside punkt home.
pub const LOG_FILE: &str = "punkt.log";

/// Log level used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Command table for a generic manager: operation name to shell command.
///
/// The special key `command` is the fallback: an operation without its own
/// entry runs `<command> <operation>`.
///
/// ```toml
/// [managers.brew]
/// command = "punkt-brew"
/// dump = "brew bundle dump --file=-"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ManagerCommands {
    commands: BTreeMap<String, String>,
}

impl ManagerCommands {
    /// The key holding the fallback command.
    pub const FALLBACK: &'static str = "command";

    /// Build a command table from `(operation, command)` pairs.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            commands: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Resolve the shell command for `operation`.
    ///
    /// An override is used verbatim; otherwise the fallback command is
    /// suffixed with the operation name.  `None` if neither is configured.
    #[must_use]
    pub fn resolve(&self, operation: &str) -> Option<String> {
        if let Some(cmd) = self.commands.get(operation) {
            return Some(cmd.clone());
        }
        self.commands
            .get(Self::FALLBACK)
            .map(|cmd| format!("{cmd} {operation}"))
    }
}

/// Values given on the command line, taking precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file; must exist when given.
    pub config: Option<PathBuf>,
    /// Explicit punkt home directory.
    pub punkt_home: Option<PathBuf>,
    /// Explicit dotfiles directory.
    pub dotfiles: Option<PathBuf>,
    /// Explicit log level.
    pub log_level: Option<String>,
}

/// On-disk layout of the global config file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    punkt_home: Option<PathBuf>,
    dotfiles: Option<PathBuf>,
    log_level: Option<String>,
    #[serde(default)]
    managers: BTreeMap<String, ManagerCommands>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The user's home directory.
    pub home: PathBuf,
    /// Directory relative paths on the command line resolve against.
    pub working_dir: PathBuf,
    /// Config file that was read, if any.
    pub config_file: Option<PathBuf>,
    /// Directory holding punkt's own state (`<name>.toml`, log file).
    pub punkt_home: PathBuf,
    /// Directory holding the canonical dotfiles.
    pub dotfiles: PathBuf,
    /// Requested log level, unparsed.
    pub log_level: String,
    /// Generic managers by name.
    pub managers: BTreeMap<String, ManagerCommands>,
}

impl Config {
    /// Default config file location for `home`.
    #[must_use]
    pub fn default_config_file(home: &Path) -> PathBuf {
        home.join(".config").join("punkt").join("config.toml")
    }

    /// Default punkt home for `home`.
    #[must_use]
    pub fn default_punkt_home(home: &Path) -> PathBuf {
        home.join(".config").join("punkt")
    }

    /// Default dotfiles directory for `home`.
    #[must_use]
    pub fn default_dotfiles(home: &Path) -> PathBuf {
        home.join(".dotfiles")
    }

    /// Load configuration.
    ///
    /// Precedence is command-line override, then the config file, then the
    /// default.  Generic managers from `<punktHome>/managers.toml` replace
    /// same-named managers from the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given config file does not exist,
    /// a config file is malformed, or a generic manager uses a reserved name.
    pub fn load(
        fs: &dyn FileSystemOps,
        home: PathBuf,
        working_dir: PathBuf,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let resolve = |p: &Path| absolute(&working_dir, &home, p);

        let (path, explicit) = match &overrides.config {
            Some(p) => (resolve(p), true),
            None => (Self::default_config_file(&home), false),
        };
        let file: Option<ConfigFile> = store::read_toml(fs, &path)?;
        if file.is_none() && explicit {
            return Err(ConfigError::NotFound(path));
        }
        let config_file = file.is_some().then_some(path);
        let file = file.unwrap_or_default();

        let punkt_home = overrides
            .punkt_home
            .as_deref()
            .or(file.punkt_home.as_deref())
            .map_or_else(|| Self::default_punkt_home(&home), resolve);
        let dotfiles = overrides
            .dotfiles
            .as_deref()
            .or(file.dotfiles.as_deref())
            .map_or_else(|| Self::default_dotfiles(&home), resolve);
        let log_level = overrides
            .log_level
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let mut managers = file.managers;
        let extra: Option<BTreeMap<String, ManagerCommands>> =
            store::read_toml(fs, &punkt_home.join(MANAGERS_FILE))?;
        managers.extend(extra.unwrap_or_default());

        if let Some(name) = managers
            .keys()
            .find(|name| RESERVED_MANAGER_NAMES.contains(&name.as_str()))
        {
            return Err(ConfigError::ReservedManagerName(name.clone()));
        }

        Ok(Self {
            home,
            working_dir,
            config_file,
            punkt_home,
            dotfiles,
            log_level,
            managers,
        })
    }

    /// Path of the per-manager file for `manager`.
    #[must_use]
    pub fn manager_file(&self, manager: &str) -> PathBuf {
        self.punkt_home.join(format!("{manager}.toml"))
    }

    /// Path of the persistent log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.punkt_home.join(LOG_FILE)
    }
}

/// Determine the user's home directory from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::MissingHome`] if neither `HOME` nor `USERPROFILE`
/// is set.
pub fn home_dir() -> Result<PathBuf, ConfigError> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingHome)
}
