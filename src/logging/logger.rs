//! Structured logger with summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::types::{Log, RunEntry, RunStatus};

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Target used for stage headers, picked up by the console formatter.
pub(super) const STAGE_TARGET: &str = "punkt::stage";

/// Structured logger with summary collection.
///
/// Messages go through [`tracing`]; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) decides where they
/// end up.  Manager outcomes are kept for [`print_summary`](Self::print_summary).
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<RunEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// `log_file` is only shown in the summary; the file itself is written by
    /// the subscriber's file layer.
    #[must_use]
    pub const fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a manager result for the summary.
    pub fn record(&self, name: &str, status: RunStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(RunEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Return a clone of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<RunEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Count the number of failed managers.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|e| e.status == RunStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded managers.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let mut ok = 0u32;
        let mut failed = 0u32;
        for entry in &entries {
            let (icon, color) = match entry.status {
                RunStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                RunStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
        }

        println!();
        self.info(&format!(
            "{} managers: \x1b[32m{ok} ok\x1b[0m, \x1b[31m{failed} failed\x1b[0m",
            ok + failed
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error);

    fn record(&self, name: &str, status: RunStatus, message: Option<&str>) {
        self.record(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new_is_empty() {
        let log = Logger::new(None);
        assert!(log.entries().is_empty());
        assert_eq!(log.failure_count(), 0);
    }

    #[test]
    fn record_with_message() {
        let log = Logger::new(None);
        log.record("git", RunStatus::Failed, Some("2 error(s)"));
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "git");
        assert_eq!(entries[0].message.as_deref(), Some("2 error(s)"));
    }

    #[test]
    fn failure_count_counts_failed_only() {
        let log = Logger::new(None);
        log.record("brew", RunStatus::Ok, None);
        log.record("git", RunStatus::Failed, Some("error"));
        log.record("symlink", RunStatus::Failed, None);
        assert_eq!(log.failure_count(), 2);
    }

    #[test]
    fn debug_always_written_to_file() {
        let (log, tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        let contents = fs::read_to_string(tmp.path().join("punkt.log")).unwrap();
        assert!(contents.contains(&format!("[debug] {marker}")));
    }

    #[test]
    fn stage_is_marked_in_file() {
        let (log, tmp, _guard) = isolated_logger();
        log.stage("Running dump for git, symlink");
        let contents = fs::read_to_string(tmp.path().join("punkt.log")).unwrap();
        assert!(contents.contains("==> Running dump for git, symlink"));
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.warn("careful");
        log_ref.error("broken");
        log_ref.record("git", RunStatus::Ok, None);
        assert_eq!(log.entries().len(), 1);
        let contents = fs::read_to_string(tmp.path().join("punkt.log")).unwrap();
        assert!(contents.contains("[warn] careful"));
        assert!(contents.contains("[error] broken"));
    }
}
