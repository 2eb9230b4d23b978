// ABOUTME: TokioScheduler - the default Scheduler backed by tokio timers.
// ABOUTME: Each timer is a spawned task sleeping until its deadline.

use std::time::Duration;

use super::{Scheduler, TimerCallback, TimerHandle};

/// Scheduler that uses the ambient tokio runtime.
///
/// Must be used from within a tokio runtime context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Create a new tokio-backed scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let sleeper = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach the callback so cancelling the timer cannot interrupt it.
            tokio::spawn(callback());
        });

        TimerHandle::new(move || sleeper.abort())
    }
}
