// ABOUTME: Root module for update-coordinator - subscriber-gated polling of a data source.
// ABOUTME: Re-exports the coordinator, scheduler and diagnostics types from submodules.

pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod prelude;
pub mod scheduler;

pub use coordinator::{DataUpdateCoordinator, RefreshOutcome};
pub use error::{ConfigError, FetchError};
