// ABOUTME: Defines the Fetch trait - the caller-supplied operation a coordinator polls.
// ABOUTME: Async closures returning Result<T, FetchError> implement it automatically.

use std::future::Future;

use async_trait::async_trait;

use crate::error::FetchError;

/// Produces the value a coordinator caches.
///
/// Return [`FetchError::UpdateFailed`] for expected, transient failures.
/// Anything else should be [`FetchError::Unexpected`].
#[async_trait]
pub trait Fetch<T>: Send + Sync {
    async fn fetch(&self) -> Result<T, FetchError>;
}

#[async_trait]
impl<T, F, Fut> Fetch<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<T, FetchError> {
        (self)().await
    }
}
