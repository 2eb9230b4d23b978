// ABOUTME: ManualScheduler - a virtual-clock Scheduler driven by explicit advance() calls.
// ABOUTME: Lets hosts with their own time source (and tests) fire timers deterministically.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Scheduler, TimerCallback, TimerHandle};

/// Timers are keyed by (deadline, sequence) so equal deadlines fire in
/// scheduling order.
type TimerKey = (Duration, u64);

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<TimerKey, TimerCallback>,
}

/// Scheduler whose clock only moves when [`ManualScheduler::advance`] is awaited.
///
/// Clones share the same clock and timer queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    /// Create a scheduler with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Move the clock forward by `by`, firing every timer that comes due.
    ///
    /// Timers fire in deadline order and each callback is awaited before the
    /// next one runs. Timers scheduled by a callback fire in the same call if
    /// their deadline falls inside the window.
    pub async fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;

        while let Some(callback) = self.pop_due(target) {
            callback().await;
        }

        let mut state = self.state.lock();
        state.now = state.now.max(target);
    }

    fn pop_due(&self, target: Duration) -> Option<TimerCallback> {
        let mut state = self.state.lock();
        let (&key, _) = state.pending.first_key_value()?;
        if key.0 > target {
            return None;
        }

        let callback = state.pending.remove(&key)?;
        state.now = key.0;
        Some(callback)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let key = {
            let mut state = self.state.lock();
            let key = (state.now + delay, state.next_seq);
            state.next_seq += 1;
            state.pending.insert(key, callback);
            key
        };

        let state = Arc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().pending.remove(&key);
            }
        })
    }
}
