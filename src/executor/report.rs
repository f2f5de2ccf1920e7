//! Failure reports and the diagnostic channel they are written to.

use parking_lot::Mutex;
use std::fmt;
use std::io::Write;

/// How a task ended when it did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The task returned an error.
    Error { message: String },
    /// The task panicked with a string message.
    Panic { message: String },
    /// The task panicked with a payload that carries no message.
    Unknown,
}

impl Failure {
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        if let Some(s) = payload.downcast_ref::<&str>() {
            Failure::Panic {
                message: s.to_string(),
            }
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Failure::Panic { message: s.clone() }
        } else {
            Failure::Unknown
        }
    }

    /// Whether a message could be recovered from the failure.
    pub fn is_classified(&self) -> bool {
        !matches!(self, Failure::Unknown)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Failure::Error { message } | Failure::Panic { message } => Some(message.as_str()),
            Failure::Unknown => None,
        }
    }
}

/// A contained failure together with the thread it happened on.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub thread_name: String,
    pub task_label: Option<String>,
    pub failure: Failure,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            Failure::Error { message } => write!(
                f,
                "Error caught in thread '{}': '{}'",
                self.thread_name, message
            ),
            Failure::Panic { message } => write!(
                f,
                "Panic caught in thread '{}': '{}'",
                self.thread_name, message
            ),
            Failure::Unknown => write!(f, "Unknown error caught in thread '{}'", self.thread_name),
        }
    }
}

/// Sink for contained task failures. Each call must emit one diagnostic.
pub trait Reporter: Send + Sync + fmt::Debug {
    fn report(&self, report: &FailureReport);
}

/// Writes one line per failure to the process's standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&self, report: &FailureReport) {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        // stderr going away is not something a worker thread can act on
        let _ = writeln!(out, "{}", report);
    }
}

/// Keeps every diagnostic line in memory.
#[derive(Debug, Default)]
pub struct CapturingReporter {
    lines: Mutex<Vec<String>>,
    reports: Mutex<Vec<FailureReport>>,
}

impl CapturingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
        self.reports.lock().clear();
    }
}

impl Reporter for CapturingReporter {
    fn report(&self, report: &FailureReport) {
        self.lines.lock().push(report.to_string());
        self.reports.lock().push(report.clone());
    }
}
