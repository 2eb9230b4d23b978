// ABOUTME: CoordinatorBuilder - fluent construction of a DataUpdateCoordinator.
// ABOUTME: Fills in the tokio scheduler and tracing diagnostics unless overridden.

use std::sync::Arc;
use std::time::Duration;

use super::config::CoordinatorConfig;
use super::coordinator::DataUpdateCoordinator;
use super::fetch::Fetch;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::ConfigError;
use crate::scheduler::{Scheduler, TokioScheduler};

/// Builder for [`DataUpdateCoordinator`].
pub struct CoordinatorBuilder<T> {
    name: String,
    update_method: Arc<dyn Fetch<T>>,
    update_interval: Duration,
    request_refresh_cooldown: Duration,
    request_refresh_immediate: bool,
    scheduler: Option<Arc<dyn Scheduler>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl<T> CoordinatorBuilder<T>
where
    T: Send + 'static,
{
    pub(crate) fn new(name: String, update_method: Arc<dyn Fetch<T>>) -> Self {
        let defaults = CoordinatorConfig::new(name);
        Self {
            update_method,
            update_interval: defaults.update_interval(),
            request_refresh_cooldown: defaults.request_refresh_cooldown(),
            request_refresh_immediate: defaults.request_refresh_immediate,
            name: defaults.name,
            scheduler: None,
            diagnostics: None,
        }
    }

    /// Time between automatic refreshes while listeners are registered.
    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Configure the debouncer behind `request_refresh`.
    pub fn request_refresh_debouncer(mut self, cooldown: Duration, immediate: bool) -> Self {
        self.request_refresh_cooldown = cooldown;
        self.request_refresh_immediate = immediate;
        self
    }

    /// Apply interval and debouncer settings from a config. The name passed
    /// to the builder is kept.
    pub fn config(self, config: &CoordinatorConfig) -> Self {
        self.update_interval(config.update_interval())
            .request_refresh_debouncer(
                config.request_refresh_cooldown(),
                config.request_refresh_immediate,
            )
    }

    /// Use a custom scheduler instead of [`TokioScheduler`].
    pub fn scheduler(self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler_arc(Arc::new(scheduler))
    }

    pub fn scheduler_arc(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Use a custom diagnostic sink instead of [`TracingSink`].
    pub fn diagnostics(self, diagnostics: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics_arc(Arc::new(diagnostics))
    }

    pub fn diagnostics_arc(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Validate the settings and create the coordinator.
    pub fn build(self) -> Result<DataUpdateCoordinator<T>, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.update_interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }

        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::new()),
        };
        let diagnostics: Arc<dyn DiagnosticSink> = match self.diagnostics {
            Some(diagnostics) => diagnostics,
            None => Arc::new(TracingSink),
        };

        Ok(DataUpdateCoordinator::from_parts(
            self.name,
            self.update_method,
            self.update_interval,
            self.request_refresh_cooldown,
            self.request_refresh_immediate,
            scheduler,
            diagnostics,
        ))
    }
}
