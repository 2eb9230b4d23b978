// ABOUTME: MemorySink - a DiagnosticSink that keeps entries in memory.
// ABOUTME: Used by hosts that surface coordinator errors, and by tests asserting on logs.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;

use super::DiagnosticSink;
use crate::coordinator::ListenerId;

/// A single recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub level: Level,
    pub coordinator: String,
    pub message: String,
}

/// Records diagnostics in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<DiagnosticEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries.lock().clone()
    }

    /// Whether any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.message.contains(needle))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn record(&self, level: Level, coordinator: &str, message: String) {
        self.entries.lock().push(DiagnosticEntry {
            level,
            coordinator: coordinator.to_string(),
            message,
        });
    }
}

impl DiagnosticSink for MemorySink {
    fn update_failed(&self, name: &str, message: &str) {
        self.record(
            Level::WARN,
            name,
            format!("Error fetching {} data: {}", name, message),
        );
    }

    fn unexpected_error(&self, name: &str, error: &anyhow::Error) {
        self.record(
            Level::ERROR,
            name,
            format!("Unexpected error fetching {} data: {:#}", name, error),
        );
    }

    fn update_recovered(&self, name: &str) {
        self.record(Level::INFO, name, format!("Fetching {} data recovered", name));
    }

    fn listener_panicked(&self, name: &str, listener: ListenerId, message: &str) {
        self.record(
            Level::ERROR,
            name,
            format!("Listener {} of {} panicked: {}", listener, name, message),
        );
    }
}
