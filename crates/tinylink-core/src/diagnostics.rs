//! Structured diagnostics emitted by the registry and its collaborators.
//!
//! Components report what happened through an injected [`DiagnosticSink`]
//! rather than a process-wide logger. Emitting never fails and never
//! influences control flow.

use jiff::Timestamp;
use parking_lot::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    LoadFailed { reason: String },
    /// A stored record was dropped because an earlier one uses its code.
    DuplicateStoredRecord { shortcode: String },
    SaveFailed { reason: String },
    ExpiredPruned { count: usize },
    ShortcodeNotFound { shortcode: String },
    ExpiredAccess { shortcode: String },
    Created {
        shortcode: String,
        long_url: String,
        expires_at: Timestamp,
    },
    ClickRecorded {
        shortcode: String,
        referrer: String,
        click_count: usize,
    },
    Cleared { count: usize },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::LoadFailed { .. } | Diagnostic::SaveFailed { .. } => Severity::Error,
            Diagnostic::DuplicateStoredRecord { .. }
            | Diagnostic::ShortcodeNotFound { .. }
            | Diagnostic::ExpiredAccess { .. } => Severity::Warn,
            Diagnostic::ExpiredPruned { .. }
            | Diagnostic::Created { .. }
            | Diagnostic::ClickRecorded { .. }
            | Diagnostic::Cleared { .. } => Severity::Info,
        }
    }
}

/// Receives diagnostics. Callers emit outside their own locks, so an
/// implementation may call back into the component that reported.
pub trait DiagnosticSink: Send + Sync + 'static {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::LoadFailed { reason } => {
                error!(%reason, "failed to load shortened urls from storage")
            }
            Diagnostic::DuplicateStoredRecord { shortcode } => {
                warn!(%shortcode, "skipping duplicate stored record")
            }
            Diagnostic::SaveFailed { reason } => {
                error!(%reason, "failed to save shortened urls to storage")
            }
            Diagnostic::ExpiredPruned { count } => info!(count, "cleaned expired urls"),
            Diagnostic::ShortcodeNotFound { shortcode } => {
                warn!(%shortcode, "shortcode not found")
            }
            Diagnostic::ExpiredAccess { shortcode } => {
                warn!(%shortcode, "attempted to access expired url")
            }
            Diagnostic::Created {
                shortcode,
                long_url,
                expires_at,
            } => info!(%shortcode, %long_url, %expires_at, "url shortened successfully"),
            Diagnostic::ClickRecorded {
                shortcode,
                referrer,
                click_count,
            } => info!(%shortcode, %referrer, click_count, "click recorded"),
            Diagnostic::Cleared { count } => info!(count, "all urls cleared"),
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

/// Keeps every diagnostic in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().clone()
    }

    /// Drains the captured diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.events.lock().push(diagnostic);
    }
}
