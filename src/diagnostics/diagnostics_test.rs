// ABOUTME: Tests for the diagnostic sinks.
// ABOUTME: Checks message wording, levels, and that clones share a buffer.

use tracing::Level;

use super::*;
use crate::coordinator::ListenerId;

#[test]
fn test_memory_sink_update_failed_message() {
    let sink = MemorySink::new();
    sink.update_failed("weather", "timeout");

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, Level::WARN);
    assert_eq!(entries[0].coordinator, "weather");
    assert_eq!(entries[0].message, "Error fetching weather data: timeout");
}

#[test]
fn test_memory_sink_unexpected_error_includes_chain() {
    let sink = MemorySink::new();
    let error = anyhow::anyhow!("connection reset").context("reading response");
    sink.unexpected_error("weather", &error);

    let entries = sink.entries();
    assert_eq!(entries[0].level, Level::ERROR);
    assert!(entries[0].message.starts_with("Unexpected error fetching weather data"));
    assert!(entries[0].message.contains("reading response"));
    assert!(entries[0].message.contains("connection reset"));
}

#[test]
fn test_memory_sink_distinguishes_failure_kinds() {
    let sink = MemorySink::new();
    sink.update_failed("x", "boom");
    assert!(sink.contains("Error fetching x data"));
    assert!(!sink.contains("Unexpected error"));

    sink.clear();
    sink.unexpected_error("x", &anyhow::anyhow!("boom"));
    assert!(sink.contains("Unexpected error fetching x data"));
}

#[test]
fn test_memory_sink_clones_share_entries() {
    let sink = MemorySink::new();
    let clone = sink.clone();

    clone.update_recovered("x");
    clone.listener_panicked("x", ListenerId::from_raw(3), "bad listener");

    let entries = sink.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "Fetching x data recovered");
    assert!(entries[1].message.contains("bad listener"));
}

#[test]
fn test_tracing_sink_does_not_panic_without_subscriber() {
    let sink = TracingSink;
    sink.update_failed("x", "boom");
    sink.unexpected_error("x", &anyhow::anyhow!("boom"));
    sink.update_recovered("x");
    sink.listener_panicked("x", ListenerId::from_raw(1), "boom");
}
