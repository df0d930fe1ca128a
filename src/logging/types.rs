//! Core logging types: run entries, status, and the [`Log`] trait.

/// Outcome of one manager during a run, for summary reporting.
#[derive(Debug, Clone)]
pub struct RunEntry {
    /// Manager name.
    pub name: String,
    /// Final status of the manager.
    pub status: RunStatus,
    /// Optional detail message (e.g., number of errors).
    pub message: Option<String>,
}

/// Status of a manager once the run is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every step for the manager succeeded.
    Ok,
    /// At least one step for the manager failed.
    Failed,
}

/// Abstraction over user-facing progress output.
///
/// [`Logger`](super::logger::Logger) is the only production implementation;
/// the trait keeps managers independent of how output is rendered.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a manager result for the summary.
    fn record(&self, name: &str, status: RunStatus, message: Option<&str>);
}

