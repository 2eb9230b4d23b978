// ABOUTME: Scheduler module - the delayed-callback capability consumed by coordinators.
// ABOUTME: Ships a tokio-backed scheduler and a manually advanced virtual clock.

mod manual;
mod runtime;
mod slot;
mod traits;

pub use manual::ManualScheduler;
pub use runtime::TokioScheduler;
pub use traits::*;

pub(crate) use slot::TimerSlot;
