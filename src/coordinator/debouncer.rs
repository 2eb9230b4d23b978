// ABOUTME: Debouncer - collapses bursts of calls into a single run of a function.
// ABOUTME: Overlapping callers share the in-flight run; a cooldown defers later calls.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::scheduler::{Scheduler, TimerCallback, TimerSlot};

/// Cooldown applied to `request_refresh` when none is configured.
pub const REQUEST_REFRESH_DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// The function being debounced.
pub type DebouncedFn<O> = Arc<dyn Fn() -> BoxFuture<'static, O> + Send + Sync>;

type InFlight<O> = Shared<BoxFuture<'static, O>>;

struct DebounceState<O> {
    inflight: Option<InFlight<O>>,
    timer: TimerSlot,
    execute_at_end_of_timer: bool,
    last_outcome: Option<O>,
}

struct DebouncerInner<O> {
    name: String,
    cooldown: Duration,
    immediate: bool,
    function: DebouncedFn<O>,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<DebounceState<O>>,
}

/// Debounces calls to an async function.
///
/// # Semantics
///
/// - **Sharing:** while a run is in flight, every call awaits that same run
///   and receives its outcome. The run is driven by a detached task, so it
///   completes even if all callers go away. A run that panics propagates
///   the panic to its callers and does not block later runs.
/// - **Cooldown:** after each run, calls within `cooldown` return the last
///   outcome immediately and request one trailing run when the cooldown ends.
///   A zero cooldown disables this.
/// - **Immediate:** when false, every call is deferred to the end of a
///   cooldown instead of running straight away.
pub struct Debouncer<O> {
    inner: Arc<DebouncerInner<O>>,
}

impl<O> Clone for Debouncer<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O> Debouncer<O>
where
    O: Clone + Send + Sync + 'static,
{
    /// Create a debouncer around `function`.
    ///
    /// # Arguments
    ///
    /// * `name` - Used in log lines only.
    /// * `scheduler` - Arms the cooldown timer.
    /// * `cooldown` - Window after a run during which calls are deferred.
    /// * `immediate` - Whether a call outside the cooldown runs right away.
    /// * `function` - Produces the future for one run.
    pub fn new<F>(
        name: impl Into<String>,
        scheduler: Arc<dyn Scheduler>,
        cooldown: Duration,
        immediate: bool,
        function: F,
    ) -> Self
    where
        F: Fn() -> BoxFuture<'static, O> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DebouncerInner {
                name: name.into(),
                cooldown,
                immediate,
                function: Arc::new(function),
                scheduler,
                state: Mutex::new(DebounceState {
                    inflight: None,
                    timer: TimerSlot::default(),
                    execute_at_end_of_timer: false,
                    last_outcome: None,
                }),
            }),
        }
    }

    /// Request a run.
    ///
    /// Returns the outcome of the run this call attached to or started. A
    /// deferred call returns the most recent outcome, or `None` if nothing
    /// has completed yet.
    pub async fn call(&self) -> Option<O> {
        let inflight = {
            let mut state = self.inner.state.lock();
            if let Some(inflight) = &state.inflight {
                Some(inflight.clone())
            } else if state.timer.is_armed() || !self.inner.immediate {
                state.execute_at_end_of_timer = true;
                if !state.timer.is_armed() {
                    self.inner.arm_timer(&mut state);
                }
                None
            } else {
                Some(self.inner.start(&mut state))
            }
        };

        match inflight {
            Some(inflight) => Some(inflight.await),
            None => {
                debug!(debouncer = %self.inner.name, "Call deferred to end of cooldown");
                self.inner.state.lock().last_outcome.clone()
            }
        }
    }

    /// Cancel the cooldown timer and drop any deferred call. An in-flight run
    /// still completes.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        state.execute_at_end_of_timer = false;
        state.timer.cancel();
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().inflight.is_some()
    }

    /// Whether the cooldown timer is armed.
    pub fn is_cooling_down(&self) -> bool {
        self.inner.state.lock().timer.is_armed()
    }

    /// Whether a deferred call is waiting for the cooldown to end.
    pub fn has_deferred_call(&self) -> bool {
        self.inner.state.lock().execute_at_end_of_timer
    }

    pub fn cooldown(&self) -> Duration {
        self.inner.cooldown
    }

    pub fn immediate(&self) -> bool {
        self.inner.immediate
    }
}

impl<O> DebouncerInner<O>
where
    O: Clone + Send + Sync + 'static,
{
    fn start(self: &Arc<Self>, state: &mut DebounceState<O>) -> InFlight<O> {
        debug!(debouncer = %self.name, "Starting debounced run");

        let inner = Arc::clone(self);
        let run = (self.function)();
        let inflight = async move {
            match AssertUnwindSafe(run).catch_unwind().await {
                Ok(outcome) => {
                    inner.finish(Some(outcome.clone()));
                    outcome
                }
                Err(payload) => {
                    // Callers of this run see the panic; later calls start afresh.
                    inner.finish(None);
                    panic::resume_unwind(payload)
                }
            }
        }
        .boxed()
        .shared();

        state.inflight = Some(inflight.clone());
        tokio::spawn(inflight.clone());
        inflight
    }

    fn finish(self: &Arc<Self>, outcome: Option<O>) {
        let mut state = self.state.lock();
        state.inflight = None;
        if outcome.is_some() {
            state.last_outcome = outcome;
        }
        if !self.cooldown.is_zero() && !state.timer.is_armed() {
            self.arm_timer(&mut state);
        }
    }

    fn arm_timer(self: &Arc<Self>, state: &mut DebounceState<O>) {
        let weak = Arc::downgrade(self);
        state
            .timer
            .arm(self.scheduler.as_ref(), self.cooldown, |generation| -> TimerCallback {
                Box::new(move || {
                    async move {
                        if let Some(inner) = weak.upgrade() {
                            inner.on_timer(generation).await;
                        }
                    }
                    .boxed()
                })
            });
    }

    async fn on_timer(self: Arc<Self>, generation: u64) {
        let run = {
            let mut state = self.state.lock();
            if !state.timer.fire(generation) {
                return;
            }
            if !std::mem::take(&mut state.execute_at_end_of_timer) {
                return;
            }
            match &state.inflight {
                Some(inflight) => inflight.clone(),
                None => self.start(&mut state),
            }
        };

        run.await;
    }
}

impl<O> Drop for DebouncerInner<O> {
    fn drop(&mut self) {
        self.state.get_mut().timer.cancel();
    }
}
