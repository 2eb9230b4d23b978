// ABOUTME: Defines the Scheduler trait - the "run this after a delay" capability
// ABOUTME: coordinators consume from the host, plus the cancelable TimerHandle.

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;

/// Work to run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Host capability for delayed callbacks.
///
/// Implementations must not run the callback inline from `schedule`; the
/// caller may be holding locks that the callback needs.
pub trait Scheduler: Send + Sync {
    /// Run `callback` once after `delay` has elapsed.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Handle to a pending timer.
///
/// Dropping the handle leaves the timer pending; call [`TimerHandle::cancel`]
/// to stop it.
pub struct TimerHandle {
    cancel: Box<dyn FnOnce() + Send>,
}

impl TimerHandle {
    /// Create a handle that runs `cancel` when the timer is cancelled.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Cancel the timer. A callback that already started is not interrupted.
    pub fn cancel(self) {
        (self.cancel)();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}
