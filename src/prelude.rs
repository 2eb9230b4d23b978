// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use update_coordinator::prelude::*;` to get started quickly.

pub use crate::coordinator::{
    CoordinatorBuilder, CoordinatorConfig, DataUpdateCoordinator, Debouncer, Fetch, ListenerId,
    REQUEST_REFRESH_DEFAULT_COOLDOWN, RefreshOutcome,
};
pub use crate::diagnostics::{DiagnosticEntry, DiagnosticSink, MemorySink, TracingSink};
pub use crate::error::{ConfigError, FetchError};
pub use crate::scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
