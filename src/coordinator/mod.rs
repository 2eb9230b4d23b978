// ABOUTME: Coordinator module - the subscriber-gated polling coordinator and its parts.
// ABOUTME: Contains the fetch trait, listener registry, debouncer, config and builder.

mod builder;
mod config;
mod coordinator;
mod debouncer;
mod fetch;
mod listeners;

pub use builder::CoordinatorBuilder;
pub use config::CoordinatorConfig;
pub use coordinator::{DataUpdateCoordinator, RefreshOutcome};
pub use debouncer::{DebouncedFn, Debouncer, REQUEST_REFRESH_DEFAULT_COOLDOWN};
pub use fetch::Fetch;
pub use listeners::{Listener, ListenerId};

#[cfg(test)]
mod debouncer_test;
