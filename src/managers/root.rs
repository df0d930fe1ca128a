//! Orchestration of every manager for one `dump`, `ensure` or `update` run.
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::{GenericManager, GitManager, Manager, ManagerConfig, ManagerKind, SymlinkManager};
use crate::config::{Config, store};
use crate::error::{ConfigError, Failure, RunError};
use crate::exec::Executor;
use crate::logging::{Log, RunStatus};
use crate::operations::FileSystemOps;
use crate::symlink::{LinkManager, Symlink};

/// Outcome of every item attempted during one run.
#[derive(Debug)]
pub struct RunReport {
    operation: &'static str,
    results: Vec<(String, Result<()>)>,
}

impl RunReport {
    /// Start an empty report for `operation`.
    #[must_use]
    pub const fn new(operation: &'static str) -> Self {
        Self {
            operation,
            results: Vec::new(),
        }
    }

    /// Record the outcome of one item belonging to `manager`.
    pub fn push(&mut self, manager: &str, result: Result<()>) {
        self.results.push((manager.to_string(), result));
    }

    /// Number of failed items.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// Reduce to `Ok(())` when nothing failed, or a [`RunError`] holding
    /// every failure in order.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if any recorded item failed.
    pub fn into_result(self) -> Result<(), RunError> {
        let failures: Vec<Failure> = self
            .results
            .into_iter()
            .filter_map(|(manager, result)| result.err().map(|error| Failure { manager, error }))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RunError {
                operation: self.operation,
                failures,
            })
        }
    }
}

/// Builds the manager set and drives each run across it.
///
/// Managers are processed one after another.  A failing manager never stops
/// the others: its error is collected and the run carries on.
#[derive(Debug, Clone)]
pub struct RootManager {
    config: Config,
    fs: Arc<dyn FileSystemOps>,
    executor: Arc<dyn Executor>,
    link_manager: LinkManager,
    log: Arc<dyn Log>,
}

impl RootManager {
    /// Create a root manager for `config`.
    #[must_use]
    pub fn new(
        config: Config,
        fs: Arc<dyn FileSystemOps>,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
    ) -> Self {
        let link_manager =
            LinkManager::new(Arc::clone(&fs), config.home.clone(), config.dotfiles.clone());
        Self {
            config,
            fs,
            executor,
            link_manager,
            log,
        }
    }

    /// The shared link manager.
    #[must_use]
    pub const fn link_manager(&self) -> &LinkManager {
        &self.link_manager
    }

    /// Path of `<punktHome>/<name>.toml`.
    #[must_use]
    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config.manager_file(name)
    }

    /// The built-in symlink manager.
    #[must_use]
    pub fn symlink(&self) -> SymlinkManager {
        SymlinkManager::new(
            self.link_manager.clone(),
            Arc::clone(&self.fs),
            self.config.working_dir.clone(),
            self.config_file(SymlinkManager::NAME),
        )
    }

    /// The built-in git manager.
    #[must_use]
    pub fn git(&self) -> GitManager {
        GitManager::new(
            self.link_manager.clone(),
            Arc::clone(&self.fs),
            Arc::clone(&self.executor),
            self.config.working_dir.clone(),
            self.config_file(GitManager::NAME),
        )
    }

    /// Every manager: generic ones in name order, then git, then symlink.
    #[must_use]
    pub fn all(&self) -> Vec<ManagerKind> {
        let mut managers: Vec<ManagerKind> = self
            .config
            .managers
            .iter()
            .map(|(name, commands)| {
                ManagerKind::Generic(GenericManager::new(
                    name.clone(),
                    commands.clone(),
                    Arc::clone(&self.executor),
                    self.config_file(name),
                ))
            })
            .collect();
        managers.push(ManagerKind::Git(self.git()));
        managers.push(ManagerKind::Symlink(self.symlink()));
        managers
    }

    /// Dump each manager and save its non-empty output to its config file.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] naming every manager whose dump or save failed.
    pub fn dump<M: Manager>(&self, managers: &[M]) -> Result<(), RunError> {
        self.run("dump", managers, |mgr| {
            let out = mgr.dump()?;
            let path = self.config_file(mgr.name());
            if store::save(self.fs.as_ref(), &out, &path)? {
                self.log
                    .debug(&format!("saved {} configuration", mgr.name()));
            }
            Ok(())
        })
    }

    /// Ensure each manager, then reconcile every symlink it declares.
    ///
    /// A manager whose own ensure fails does not get its symlinks
    /// reconciled.  A failing symlink does not stop the remaining ones.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] naming every manager with at least one failure.
    pub fn ensure<M: Manager>(&self, managers: &[M]) -> Result<(), RunError> {
        let mut report = RunReport::new("ensure");
        self.log
            .stage(&format!("Running ensure for {}", names(managers)));

        for mgr in managers {
            let name = mgr.name();
            tracing::debug!(manager = name, "running ensure");
            let before = report.failure_count();

            match mgr
                .ensure()
                .and_then(|()| self.read_symlinks(name).map_err(Into::into))
            {
                Ok(symlinks) => {
                    for symlink in symlinks {
                        let expanded = self.link_manager.expand(&symlink);
                        let result = self
                            .link_manager
                            .ensure(&expanded)
                            .map(|_| ())
                            .with_context(|| format!("unable to ensure {symlink}"));
                        if let Err(e) = &result {
                            self.log.error(&format!("{name}: {e:#}"));
                        }
                        report.push(name, result);
                    }
                }
                Err(e) => {
                    self.log.error(&format!("{name}: {e:#}"));
                    report.push(name, Err(e));
                }
            }

            self.record(name, report.failure_count() - before);
        }

        report.into_result()
    }

    /// Update each manager.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] naming every manager whose update failed.
    pub fn update<M: Manager>(&self, managers: &[M]) -> Result<(), RunError> {
        self.run("update", managers, Manager::update)
    }

    /// Symlinks declared in `<name>.toml`, in stored form.  A missing file
    /// declares none.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the file exists but is malformed.
    pub fn read_symlinks(&self, name: &str) -> Result<Vec<Symlink>, ConfigError> {
        let config: Option<ManagerConfig> =
            store::read_toml(self.fs.as_ref(), &self.config_file(name))?;
        Ok(config
            .map(|c| c.symlinks.symlinks())
            .unwrap_or_default())
    }

    fn run<M: Manager>(
        &self,
        operation: &'static str,
        managers: &[M],
        step: impl Fn(&M) -> Result<()>,
    ) -> Result<(), RunError> {
        let mut report = RunReport::new(operation);
        self.log
            .stage(&format!("Running {operation} for {}", names(managers)));

        for mgr in managers {
            let name = mgr.name();
            tracing::debug!(manager = name, operation, "running manager");
            let result = step(mgr);
            let failed = usize::from(result.is_err());
            if let Err(e) = &result {
                self.log.error(&format!("{name}: {e:#}"));
            }
            report.push(name, result);
            self.record(name, failed);
        }

        report.into_result()
    }

    fn record(&self, name: &str, failures: usize) {
        if failures == 0 {
            self.log.record(name, RunStatus::Ok, None);
        } else {
            let message = format!("{failures} error(s)");
            self.log.record(name, RunStatus::Failed, Some(&message));
        }
    }
}

fn names<M: Manager>(managers: &[M]) -> String {
    managers
        .iter()
        .map(Manager::name)
        .collect::<Vec<_>>()
        .join(", ")
}
