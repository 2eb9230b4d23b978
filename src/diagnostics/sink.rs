// ABOUTME: DiagnosticSink trait - where coordinators report fetch failures.
// ABOUTME: TracingSink is the default implementation, forwarding to tracing.

use tracing::{error, info, warn};

use crate::coordinator::ListenerId;

/// Receiver for coordinator diagnostics.
///
/// Injected into each coordinator so failure reporting can be observed or
/// redirected without a process-wide logger.
pub trait DiagnosticSink: Send + Sync {
    /// The fetch reported an expected update failure.
    fn update_failed(&self, name: &str, message: &str);

    /// The fetch failed with an unexpected error.
    fn unexpected_error(&self, name: &str, error: &anyhow::Error);

    /// A fetch succeeded after one or more failures.
    fn update_recovered(&self, name: &str) {
        let _ = name;
    }

    /// A listener panicked while being notified.
    fn listener_panicked(&self, name: &str, listener: ListenerId, message: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn update_failed(&self, name: &str, message: &str) {
        warn!(coordinator = %name, "Error fetching {} data: {}", name, message);
    }

    fn unexpected_error(&self, name: &str, error: &anyhow::Error) {
        error!(coordinator = %name, "Unexpected error fetching {} data: {:#}", name, error);
    }

    fn update_recovered(&self, name: &str) {
        info!(coordinator = %name, "Fetching {} data recovered", name);
    }

    fn listener_panicked(&self, name: &str, listener: ListenerId, message: &str) {
        error!(
            coordinator = %name,
            listener = %listener,
            "Listener of {} panicked: {}", name, message
        );
    }
}
