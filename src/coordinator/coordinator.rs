// ABOUTME: DataUpdateCoordinator - polls a fetch operation while anyone is listening.
// ABOUTME: Caches the last good value, tracks failures, and debounces manual refreshes.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::builder::CoordinatorBuilder;
use super::config::CoordinatorConfig;
use super::debouncer::Debouncer;
use super::fetch::Fetch;
use super::listeners::{ListenerId, ListenerRegistry};
use crate::diagnostics::DiagnosticSink;
use crate::error::{ConfigError, FetchError};
use crate::scheduler::{Scheduler, TimerCallback, TimerSlot};

/// Result of a single refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch succeeded and `data` was replaced.
    Updated,
    /// The fetch failed; `data` still holds the previous value.
    Failed,
}

impl RefreshOutcome {
    pub fn is_success(self) -> bool {
        self == RefreshOutcome::Updated
    }
}

/// Completes with the outcome of the refresh in progress, or `None` if that
/// refresh was abandoned before finishing.
type RunningRefresh = Shared<BoxFuture<'static, Option<RefreshOutcome>>>;

struct CoordinatorState<T> {
    data: Option<T>,
    failed_last_update: bool,
    last_error: Option<String>,
    update_interval: Duration,
    listeners: ListenerRegistry,
    timer: TimerSlot,
    running: Option<RunningRefresh>,
}

struct CoordinatorInner<T> {
    name: String,
    update_method: RwLock<Arc<dyn Fetch<T>>>,
    scheduler: Arc<dyn Scheduler>,
    diagnostics: Arc<dyn DiagnosticSink>,
    debouncer: Debouncer<RefreshOutcome>,
    /// Held for the whole fetch-update-notify sequence so fetches never overlap.
    refresh_lock: tokio::sync::Mutex<()>,
    state: Mutex<CoordinatorState<T>>,
}

/// Periodically fetches a value while at least one listener is registered.
///
/// # Semantics
///
/// - **Stale-but-valid:** a failed fetch never touches `data`; it only sets
///   `failed_last_update`. Errors are reported to the diagnostic sink and
///   never returned to callers.
/// - **Listener-gated timer:** the refresh timer is armed when the first
///   listener is added and cancelled when the last one is removed.
/// - **Serialized fetches:** at most one fetch runs at a time. A debounced
///   request that arrives while any refresh is running waits for that
///   refresh instead of fetching again. A panicking fetch is reported as an
///   unexpected error.
/// - **Notification:** listeners run synchronously, in registration order,
///   after every refresh attempt. A panicking listener is reported and the
///   rest are still notified.
///
/// Clones share the same state. Timers hold only weak references, so
/// dropping every clone stops automatic refreshes.
pub struct DataUpdateCoordinator<T> {
    inner: Arc<CoordinatorInner<T>>,
}

impl<T> Clone for DataUpdateCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> DataUpdateCoordinator<T>
where
    T: Send + 'static,
{
    /// Start building a coordinator for `name` around `update_method`.
    pub fn builder(
        name: impl Into<String>,
        update_method: impl Fetch<T> + 'static,
    ) -> CoordinatorBuilder<T> {
        CoordinatorBuilder::new(name.into(), Arc::new(update_method))
    }

    /// Create a coordinator with the default scheduler, diagnostics and
    /// request-refresh debouncer.
    pub fn new(
        name: impl Into<String>,
        update_method: impl Fetch<T> + 'static,
        update_interval: Duration,
    ) -> Result<Self, ConfigError> {
        Self::builder(name, update_method)
            .update_interval(update_interval)
            .build()
    }

    /// Create a coordinator from a parsed [`CoordinatorConfig`].
    pub fn from_config(
        config: &CoordinatorConfig,
        update_method: impl Fetch<T> + 'static,
    ) -> Result<Self, ConfigError> {
        Self::builder(config.name.clone(), update_method)
            .config(config)
            .build()
    }

    pub(crate) fn from_parts(
        name: String,
        update_method: Arc<dyn Fetch<T>>,
        update_interval: Duration,
        request_refresh_cooldown: Duration,
        request_refresh_immediate: bool,
        scheduler: Arc<dyn Scheduler>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<CoordinatorInner<T>>| {
            let weak = weak.clone();
            let debouncer = Debouncer::new(
                name.clone(),
                Arc::clone(&scheduler),
                request_refresh_cooldown,
                request_refresh_immediate,
                move || {
                    let weak = weak.clone();
                    async move {
                        match weak.upgrade() {
                            Some(inner) => inner.refresh_coalesced().await,
                            // The coordinator is gone, nothing was fetched.
                            None => RefreshOutcome::Failed,
                        }
                    }
                    .boxed()
                },
            );

            CoordinatorInner {
                name,
                update_method: RwLock::new(update_method),
                scheduler,
                diagnostics,
                debouncer,
                refresh_lock: tokio::sync::Mutex::new(()),
                state: Mutex::new(CoordinatorState {
                    data: None,
                    failed_last_update: false,
                    last_error: None,
                    update_interval,
                    listeners: ListenerRegistry::default(),
                    timer: TimerSlot::default(),
                    running: None,
                }),
            }
        });

        Self { inner }
    }

    /// Fetch now, update state, and notify every listener.
    ///
    /// Waits for any refresh already running to finish first. Fetch errors
    /// are absorbed; inspect the returned outcome or `failed_last_update`.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.inner.refresh().await
    }

    /// Debounced refresh.
    ///
    /// Calls that overlap any running refresh, whether started by the timer,
    /// by [`refresh`](Self::refresh) or by another request, share its fetch
    /// and outcome.
    /// Calls during the cooldown that follows are deferred to one trailing
    /// refresh and return the latest outcome straight away; `None` means the
    /// request was deferred before any refresh had completed.
    pub async fn request_refresh(&self) -> Option<RefreshOutcome> {
        self.inner.debouncer.call().await
    }

    /// Register a listener for future refreshes and return its id.
    ///
    /// The first listener arms the refresh timer. The listener is not
    /// called for the current state.
    ///
    /// With the default [`TokioScheduler`](crate::scheduler::TokioScheduler)
    /// this must be called from within a tokio runtime.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut state = self.inner.state.lock();
        let id = state.listeners.insert(Arc::new(listener));
        if state.listeners.len() == 1 && !state.timer.is_armed() {
            self.inner.schedule_refresh(&mut state);
        }
        debug!(coordinator = %self.inner.name, listener = %id, "Listener added");
        id
    }

    /// Remove a listener. Returns false if `id` was not registered.
    ///
    /// Removing the last listener cancels the refresh timer; a refresh that
    /// is already running still completes. Safe to call from a listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.inner.state.lock();
        if !state.listeners.remove(id) {
            return false;
        }
        if state.listeners.is_empty() {
            state.timer.cancel();
        }
        debug!(coordinator = %self.inner.name, listener = %id, "Listener removed");
        true
    }

    /// Replace the cached data without fetching.
    ///
    /// Clears the failure flag, restarts the refresh interval if listeners
    /// are registered, and notifies listeners.
    pub fn set_updated_data(&self, data: T) {
        {
            let mut state = self.inner.state.lock();
            state.data = Some(data);
            state.failed_last_update = false;
            state.last_error = None;
            if !state.listeners.is_empty() {
                self.inner.schedule_refresh(&mut state);
            }
        }
        self.inner.notify_listeners();
    }

    /// Swap the fetch operation. Applies from the next refresh.
    pub fn set_update_method(&self, update_method: impl Fetch<T> + 'static) {
        let update_method: Arc<dyn Fetch<T>> = Arc::new(update_method);
        *self.inner.update_method.write() = update_method;
    }

    /// Change the refresh interval. Applies the next time the timer is armed.
    pub fn set_update_interval(&self, update_interval: Duration) {
        self.inner.state.lock().update_interval = update_interval;
    }

    /// Remove every listener and cancel all timers. The coordinator remains
    /// usable afterwards.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            state.listeners.clear();
            state.timer.cancel();
        }
        self.inner.debouncer.shutdown();
        debug!(coordinator = %self.inner.name, "Coordinator shut down");
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the most recent refresh attempt failed.
    pub fn failed_last_update(&self) -> bool {
        self.inner.state.lock().failed_last_update
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    pub fn update_interval(&self) -> Duration {
        self.inner.state.lock().update_interval
    }

    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }

    /// Whether the refresh timer is currently armed.
    pub fn is_armed(&self) -> bool {
        self.inner.state.lock().timer.is_armed()
    }

    /// Run `f` against the cached data.
    ///
    /// The coordinator is locked while `f` runs; do not call back into it.
    pub fn with_data<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.state.lock().data.as_ref())
    }
}

impl<T> DataUpdateCoordinator<T>
where
    T: Clone + Send + 'static,
{
    /// The last successfully fetched value, if any.
    pub fn data(&self) -> Option<T> {
        self.inner.state.lock().data.clone()
    }
}

impl<T> CoordinatorInner<T>
where
    T: Send + 'static,
{
    async fn refresh(&self) -> RefreshOutcome {
        let serialized = self.refresh_lock.lock().await;
        self.run_refresh(serialized).await
    }

    /// Join the refresh in progress, or start one if none is running.
    async fn refresh_coalesced(&self) -> RefreshOutcome {
        loop {
            let running = self.state.lock().running.clone();
            if let Some(running) = running {
                match running.await {
                    Some(outcome) => return outcome,
                    None => continue,
                }
            }

            match self.refresh_lock.try_lock() {
                Ok(serialized) => return self.run_refresh(serialized).await,
                // Lock taken but the run is not published yet.
                Err(_) => tokio::task::yield_now().await,
            }
        }
    }

    async fn run_refresh(&self, _serialized: tokio::sync::MutexGuard<'_, ()>) -> RefreshOutcome {
        let run = RefreshRun::publish(&self.state);

        let update_method = Arc::clone(&*self.update_method.read());
        let started = Instant::now();
        let result = match AssertUnwindSafe(update_method.fetch()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(FetchError::Unexpected(anyhow::anyhow!(
                "fetch panicked: {}",
                panic_message(payload.as_ref())
            ))),
        };

        let outcome = match result {
            Ok(data) => {
                let recovered = {
                    let mut state = self.state.lock();
                    let recovered = state.failed_last_update;
                    state.data = Some(data);
                    state.failed_last_update = false;
                    state.last_error = None;
                    recovered
                };
                debug!(
                    coordinator = %self.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Finished fetching {} data", self.name
                );
                if recovered {
                    self.diagnostics.update_recovered(&self.name);
                }
                RefreshOutcome::Updated
            }
            Err(error) => {
                {
                    let mut state = self.state.lock();
                    state.failed_last_update = true;
                    state.last_error = Some(error.to_string());
                }
                match &error {
                    FetchError::UpdateFailed(message) => {
                        self.diagnostics.update_failed(&self.name, message)
                    }
                    FetchError::Unexpected(error) => {
                        self.diagnostics.unexpected_error(&self.name, error)
                    }
                }
                RefreshOutcome::Failed
            }
        };

        self.notify_listeners();
        run.finish(outcome);
        outcome
    }

    /// Notify listeners registered when the walk starts. Each id is looked up
    /// again before its call, so a listener removed mid-walk is skipped and one
    /// added mid-walk waits for the next refresh.
    fn notify_listeners(&self) {
        let ids = self.state.lock().listeners.ids();
        for id in ids {
            let listener = self.state.lock().listeners.get(id);
            let Some(listener) = listener else {
                continue;
            };

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener())) {
                self.diagnostics
                    .listener_panicked(&self.name, id, &panic_message(payload.as_ref()));
            }
        }
    }

    fn schedule_refresh(self: &Arc<Self>, state: &mut CoordinatorState<T>) {
        let weak = Arc::downgrade(self);
        let interval = state.update_interval;
        state
            .timer
            .arm(self.scheduler.as_ref(), interval, |generation| -> TimerCallback {
                Box::new(move || {
                    async move {
                        if let Some(inner) = weak.upgrade() {
                            inner.handle_refresh_interval(generation).await;
                        }
                    }
                    .boxed()
                })
            });
    }

    async fn handle_refresh_interval(self: Arc<Self>, generation: u64) {
        if !self.state.lock().timer.fire(generation) {
            return;
        }

        self.refresh().await;

        let mut state = self.state.lock();
        if !state.listeners.is_empty() && !state.timer.is_armed() {
            self.schedule_refresh(&mut state);
        }
    }
}

impl<T> Drop for CoordinatorInner<T> {
    fn drop(&mut self) {
        self.state.get_mut().timer.cancel();
    }
}

/// Publishes a refresh in progress so debounced requests can wait on it.
struct RefreshRun<'a, T> {
    state: &'a Mutex<CoordinatorState<T>>,
    done: Option<oneshot::Sender<RefreshOutcome>>,
}

impl<'a, T> RefreshRun<'a, T> {
    fn publish(state: &'a Mutex<CoordinatorState<T>>) -> Self {
        let (done, finished) = oneshot::channel();
        state.lock().running = Some(finished.map(Result::ok).boxed().shared());
        Self {
            state,
            done: Some(done),
        }
    }

    fn finish(mut self, outcome: RefreshOutcome) {
        self.state.lock().running = None;
        if let Some(done) = self.done.take() {
            let _ = done.send(outcome);
        }
    }
}

impl<T> Drop for RefreshRun<'_, T> {
    fn drop(&mut self) {
        // Abandoned mid-fetch; waiters see `None` and retry.
        if self.done.is_some() {
            self.state.lock().running = None;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
