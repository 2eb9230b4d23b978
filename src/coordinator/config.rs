// ABOUTME: CoordinatorConfig - serde settings for a coordinator with per-field defaults.
// ABOUTME: Parses from JSON and validates the interval and name.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::debouncer::REQUEST_REFRESH_DEFAULT_COOLDOWN;
use crate::error::ConfigError;

/// Serializable settings for a [`DataUpdateCoordinator`](super::DataUpdateCoordinator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Name used in diagnostics
    pub name: String,

    /// Seconds between automatic refreshes while listeners are registered
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Cooldown for debounced refresh requests, in milliseconds. Zero disables it.
    #[serde(default = "default_request_refresh_cooldown_ms")]
    pub request_refresh_cooldown_ms: u64,

    /// Whether a debounced request outside the cooldown runs right away
    #[serde(default = "default_request_refresh_immediate")]
    pub request_refresh_immediate: bool,
}

fn default_update_interval_secs() -> u64 {
    30
}

fn default_request_refresh_cooldown_ms() -> u64 {
    REQUEST_REFRESH_DEFAULT_COOLDOWN.as_millis() as u64
}

fn default_request_refresh_immediate() -> bool {
    true
}

impl CoordinatorConfig {
    /// Config with defaults for everything but the name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            update_interval_secs: default_update_interval_secs(),
            request_refresh_cooldown_ms: default_request_refresh_cooldown_ms(),
            request_refresh_immediate: default_request_refresh_immediate(),
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.update_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn request_refresh_cooldown(&self) -> Duration {
        Duration::from_millis(self.request_refresh_cooldown_ms)
    }
}
