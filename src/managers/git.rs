//! Git repositories and the global git configuration files.
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Manager;
use crate::config::store;
use crate::error::ManagerError;
use crate::exec::Executor;
use crate::operations::FileSystemOps;
use crate::path::{absolute, as_absolute, expand_home, unexpand_home};
use crate::symlink::{LinkManager, SymlinkConfig};

/// A repository the git manager keeps cloned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Display name, taken from the remote URL.
    pub name: String,
    /// Location of the working tree, in stored (`~`) form.
    pub path: PathBuf,
    /// URL the repository is cloned from.
    pub remote: String,
}

/// Contents of `git.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    /// Global git config files, linked into the dotfiles directory.
    #[serde(default)]
    pub symlinks: SymlinkConfig,
    /// Repositories to keep cloned.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<Repository>,
}

/// Tracks cloned repositories and links the global git config files.
#[derive(Debug, Clone)]
pub struct GitManager {
    link_manager: LinkManager,
    fs: Arc<dyn FileSystemOps>,
    executor: Arc<dyn Executor>,
    working_dir: PathBuf,
    config_file: PathBuf,
}

impl GitManager {
    /// Name of the manager and stem of its config file.
    pub const NAME: &'static str = "git";

    /// Create a git manager persisting to `config_file`.
    #[must_use]
    pub fn new(
        link_manager: LinkManager,
        fs: Arc<dyn FileSystemOps>,
        executor: Arc<dyn Executor>,
        working_dir: PathBuf,
        config_file: PathBuf,
    ) -> Self {
        Self {
            link_manager,
            fs,
            executor,
            working_dir,
            config_file,
        }
    }

    /// Record the repository at `path`.
    ///
    /// The remote is `origin` when present, otherwise the first remote
    /// listed.  A repository already recorded at the same path is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist, has no remote, or the
    /// record cannot be read or written.
    pub fn add_repository(&self, path: &Path) -> Result<Repository> {
        let home = self.link_manager.home();
        let abs = as_absolute(self.fs.as_ref(), &self.working_dir, home, path)?;
        let remote = self.remote_of(&abs)?;

        let repo = Repository {
            name: repository_name(&remote),
            path: unexpand_home(&abs, home),
            remote,
        };

        let mut config = self.read()?;
        config.repositories.retain(|r| r.path != repo.path);
        config.repositories.push(repo.clone());
        store::save_toml(self.fs.as_ref(), &config, &self.config_file)?;

        tracing::info!(name = %repo.name, path = %repo.path.display(), "repository added");
        Ok(repo)
    }

    /// Drop the record of the repository at `path`.  The working tree is
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::RepositoryNotFound`] if no repository is
    /// recorded at `path`.
    pub fn remove_repository(&self, path: &Path) -> Result<Repository> {
        let home = self.link_manager.home();
        let stored = unexpand_home(&absolute(&self.working_dir, home, path), home);

        let mut config = self.read()?;
        let index = config
            .repositories
            .iter()
            .position(|r| r.path == stored)
            .ok_or_else(|| ManagerError::RepositoryNotFound(path.to_path_buf()))?;
        let repo = config.repositories.remove(index);
        store::save_toml(self.fs.as_ref(), &config, &self.config_file)?;

        tracing::info!(name = %repo.name, "repository removed");
        Ok(repo)
    }

    fn read(&self) -> Result<GitConfig> {
        let config: Option<GitConfig> = store::read_toml(self.fs.as_ref(), &self.config_file)?;
        Ok(config.unwrap_or_default())
    }

    fn remote_of(&self, repo: &Path) -> Result<String> {
        let url = match self
            .executor
            .run_in(repo, "git", &["remote", "get-url", "origin"])
        {
            Ok(result) => result.stdout,
            Err(e) => {
                tracing::debug!("no origin remote: {e:#}");
                let remotes = self
                    .executor
                    .run_in(repo, "git", &["remote"])
                    .with_context(|| format!("failed to list remotes of {}", repo.display()))?;
                let first = remotes
                    .stdout
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .ok_or_else(|| ManagerError::NoRemote(repo.to_path_buf()))?
                    .to_string();
                self.executor
                    .run_in(repo, "git", &["remote", "get-url", &first])?
                    .stdout
            }
        };

        let url = url.trim();
        if url.is_empty() {
            return Err(ManagerError::NoRemote(repo.to_path_buf()).into());
        }
        Ok(url.to_string())
    }

    /// Paths of the global git config files, as reported by git.
    fn global_config_files(&self) -> BTreeSet<PathBuf> {
        let result = match self.executor.run_unchecked(
            "git",
            &["config", "--list", "--show-origin", "--global"],
        ) {
            Ok(result) if result.success => result,
            Ok(result) => {
                tracing::warn!(stderr = %result.stderr.trim(), "failed to find git config files");
                return BTreeSet::new();
            }
            Err(e) => {
                tracing::warn!("failed to find git config files: {e:#}");
                return BTreeSet::new();
            }
        };
        parse_config_origins(&result.stdout)
    }

    fn clone_repository(&self, repo: &Repository, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.fs
                .create_dir_all(parent)
                .with_context(|| format!("unable to create {}", parent.display()))?;
        }
        let dest = path.to_string_lossy();
        tracing::info!(name = %repo.name, remote = %repo.remote, "cloning repository");
        self.executor
            .run("git", &["clone", &repo.remote, &dest])
            .with_context(|| format!("failed to clone {}", repo.remote))?;
        Ok(())
    }
}

/// Extract the distinct `file:<path>` origins from
/// `git config --list --show-origin` output.
///
/// The origin is separated from the entry by a tab; the path itself may
/// contain spaces.
fn parse_config_origins(output: &str) -> BTreeSet<PathBuf> {
    output
        .lines()
        .filter_map(|row| row.strip_prefix("file:"))
        .filter_map(|rest| rest.split_once('\t').map(|(origin, _)| origin))
        .filter(|origin| !origin.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Name a repository after the last segment of its remote URL.
fn repository_name(remote: &str) -> String {
    let trimmed = remote.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

impl Manager for GitManager {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Link the discovered global git config files and keep the recorded
    /// repositories.
    fn dump(&self) -> Result<String> {
        let mut symlinks = SymlinkConfig::default();
        for file in self.global_config_files() {
            let symlink = self.link_manager.symlink(None, Some(file.as_path()));
            if symlink.target.as_os_str().is_empty() {
                tracing::warn!(file = %file.display(), "git config file is outside home, skipping");
                continue;
            }
            symlinks.insert(self.link_manager.unexpand(&symlink));
        }

        let config = GitConfig {
            symlinks,
            repositories: self.read()?.repositories,
        };
        toml::to_string(&config).context("failed to serialize git configuration")
    }

    fn ensure(&self) -> Result<()> {
        let mut failed = Vec::new();
        for repo in self.read()?.repositories {
            let path = expand_home(&repo.path, self.link_manager.home());
            if self.fs.exists(&path) {
                tracing::debug!(name = %repo.name, "repository already exists");
                continue;
            }
            if let Err(e) = self.clone_repository(&repo, &path) {
                tracing::error!(name = %repo.name, "{e:#}");
                failed.push(repo.name);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ManagerError::RepositoriesFailed {
                operation: "ensure",
                names: failed,
            }
            .into())
        }
    }

    fn update(&self) -> Result<()> {
        let mut failed = Vec::new();
        for repo in self.read()?.repositories {
            let path = expand_home(&repo.path, self.link_manager.home());
            tracing::info!(name = %repo.name, "updating repository");
            if let Err(e) = self.executor.run_in(&path, "git", &["pull"]) {
                tracing::error!(name = %repo.name, "{e:#}");
                failed.push(repo.name);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ManagerError::RepositoriesFailed {
                operation: "update",
                names: failed,
            }
            .into())
        }
    }
}
