//! Diagnostics collector shared by the pipeline components
//!
//! Every recorded entry is forwarded to `tracing` and kept in memory, so a
//! caller (or a test) can inspect what went wrong after a run without
//! scraping log output.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// A single recorded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,

    /// Component that produced the entry (`fetcher`, `extractor`, ...)
    pub component: &'static str,

    pub message: String,
}

/// Cloneable handle to a shared diagnostics log
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry and emits it as a `tracing` event
    pub fn record(
        &self,
        level: DiagnosticLevel,
        component: &'static str,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match level {
            DiagnosticLevel::Debug => tracing::debug!(component, "{}", message),
            DiagnosticLevel::Info => tracing::info!(component, "{}", message),
            DiagnosticLevel::Warn => tracing::warn!(component, "{}", message),
            DiagnosticLevel::Error => tracing::error!(component, "{}", message),
        }

        self.lock().push(Diagnostic {
            level,
            component,
            message,
        });
    }

    pub fn debug(&self, component: &'static str, message: impl Into<String>) {
        self.record(DiagnosticLevel::Debug, component, message);
    }

    pub fn info(&self, component: &'static str, message: impl Into<String>) {
        self.record(DiagnosticLevel::Info, component, message);
    }

    pub fn warn(&self, component: &'static str, message: impl Into<String>) {
        self.record(DiagnosticLevel::Warn, component, message);
    }

    pub fn error(&self, component: &'static str, message: impl Into<String>) {
        self.record(DiagnosticLevel::Error, component, message);
    }

    /// Copy of every entry recorded so far, oldest first
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Entries at `level` or above
    pub fn at_least(&self, level: DiagnosticLevel) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| d.level >= level)
            .cloned()
            .collect()
    }

    /// Returns true if any entry's message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|d| d.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock leaves the Vec intact; keep using it.
    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
