// ABOUTME: TimerSlot - owns at most one armed timer and rejects stale fires.
// ABOUTME: Shared by the coordinator's refresh timer and the debouncer cooldown.

use std::time::Duration;

use super::{Scheduler, TimerCallback, TimerHandle};

/// Holds the currently armed timer, tagged with a generation.
///
/// A callback that fires after its timer was cancelled or replaced carries an
/// old generation, and [`TimerSlot::fire`] turns it away.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot {
    armed: Option<(u64, TimerHandle)>,
    generation: u64,
}

impl TimerSlot {
    pub(crate) fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Cancel any armed timer and arm a new one. `callback` receives the
    /// generation it must pass back to [`TimerSlot::fire`].
    pub(crate) fn arm(
        &mut self,
        scheduler: &dyn Scheduler,
        delay: Duration,
        callback: impl FnOnce(u64) -> TimerCallback,
    ) {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let handle = scheduler.schedule(delay, callback(generation));
        self.armed = Some((generation, handle));
    }

    /// Returns true if a timer was armed.
    pub(crate) fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some((_, handle)) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Record that the timer with `generation` fired. Returns false for a
    /// stale fire, leaving the slot untouched.
    pub(crate) fn fire(&mut self, generation: u64) -> bool {
        match &self.armed {
            Some((armed, _)) if *armed == generation => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}
