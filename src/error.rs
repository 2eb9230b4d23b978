// ABOUTME: Defines the error types for update-coordinator using thiserror.
// ABOUTME: FetchError classifies fetch failures, ConfigError covers construction.

/// Failure returned by a fetch operation.
///
/// Both variants leave the coordinator in the same recoverable state. They
/// differ only in how loudly the failure is reported.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The fetch could not retrieve data this cycle. Expected and transient.
    #[error("{0}")]
    UpdateFailed(String),

    /// Anything else. Usually a bug in the fetch operation.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl FetchError {
    /// Create an expected update failure with the given message.
    pub fn update_failed(message: impl Into<String>) -> Self {
        Self::UpdateFailed(message.into())
    }

    /// Whether this is an expected update failure.
    pub fn is_update_failed(&self) -> bool {
        matches!(self, Self::UpdateFailed(_))
    }
}

/// Errors from building a coordinator or parsing its configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("update interval must be greater than zero")]
    InvalidInterval,

    #[error("coordinator name must not be empty")]
    EmptyName,

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
