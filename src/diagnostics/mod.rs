// ABOUTME: Diagnostics module - injected reporting of fetch and listener failures.
// ABOUTME: TracingSink logs through tracing; MemorySink captures entries.

mod memory;
mod sink;

pub use memory::{DiagnosticEntry, MemorySink};
pub use sink::{DiagnosticSink, TracingSink};

#[cfg(test)]
mod diagnostics_test;
