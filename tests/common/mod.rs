// Shared helpers for integration tests.
//
// Provides an in-memory home directory and a scripted executor so each
// integration test can drive the managers end to end without touching the
// real filesystem or spawning processes.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use punkt::config::{Config, Overrides};
use punkt::exec::{ExecResult, Executor};
use punkt::logging::Logger;
use punkt::managers::RootManager;
use punkt::operations::MemoryFileSystem;

/// Home directory used by every test.
pub const HOME: &str = "/home";

/// Dotfiles directory used by every test.
pub const DOTFILES: &str = "/home/.dotfiles";

/// Directory holding punkt's per-manager files.
pub const PUNKT_HOME: &str = "/home/.config/punkt";

/// One recorded process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub dir: Option<PathBuf>,
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// The program and its arguments joined by spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An [`Executor`] that answers from a queue of `(success, stdout)` pairs.
///
/// When the queue runs dry every command succeeds with empty output.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<(bool, String)>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    pub fn new(responses: Vec<(bool, &str)>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(ok, out)| (ok, out.to_string()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn next(&self, dir: Option<&Path>, program: &str, args: &[&str]) -> ExecResult {
        self.calls.lock().expect("calls lock").push(Invocation {
            dir: dir.map(Path::to_path_buf),
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        });
        let (success, stdout) = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or((true, String::new()));
        ExecResult {
            stdout,
            stderr: if success { String::new() } else { "scripted failure".to_string() },
            success,
            code: Some(if success { 0 } else { 1 }),
        }
    }

    fn checked(&self, dir: Option<&Path>, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.next(dir, program, args);
        if !result.success {
            bail!("{program} failed: {}", result.stderr);
        }
        Ok(result)
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.checked(None, program, args)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.checked(Some(dir), program, args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Ok(self.next(None, program, args))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Ok(self.next(None, program, args))
    }
}

/// A root manager wired to an in-memory home directory.
pub struct TestHome {
    pub fs: Arc<MemoryFileSystem>,
    pub executor: Arc<ScriptedExecutor>,
    pub log: Arc<Logger>,
    pub root: RootManager,
}

impl TestHome {
    /// Build a home from `fs`, with the dotfiles directory present.
    pub fn new(fs: MemoryFileSystem) -> Self {
        Self::with_executor(fs, ScriptedExecutor::default())
    }

    /// Build a home from `fs` whose commands are answered by `executor`.
    pub fn with_executor(fs: MemoryFileSystem, executor: ScriptedExecutor) -> Self {
        let fs = Arc::new(fs.with_dir(DOTFILES));
        let executor = Arc::new(executor);
        let config = Config::load(
            fs.as_ref(),
            PathBuf::from(HOME),
            PathBuf::from(HOME),
            Overrides::default(),
        )
        .expect("load config");
        let log = Arc::new(Logger::new(None));
        let root = RootManager::new(config, fs.clone(), executor.clone(), log.clone());
        Self {
            fs,
            executor,
            log,
            root,
        }
    }

    /// Contents of the per-manager file for `manager`, if it exists.
    pub fn manager_file(&self, manager: &str) -> Option<String> {
        self.fs
            .contents(format!("{PUNKT_HOME}/{manager}.toml"))
            .map(|bytes| String::from_utf8(bytes).expect("utf-8 manager file"))
    }
}
