//! Page fetching seam and fetch progress reporting.

use std::future::Future;

use async_trait::async_trait;

use crate::error::{FetchError, PageFetchFailure};
use crate::paginator::PageRequest;

/// Produces the rows of one page.
///
/// Implemented for any `Fn(PageRequest) -> impl Future<Output = Result<Vec<T>, FetchError>>`,
/// so a closure or an `async fn` can be passed directly.
///
/// Each call resolves once. Retries, if any, belong to the implementation.
///
/// # Example
///
/// ```ignore
/// let fetcher = |request: PageRequest| async move {
///     let rows = client.people(request.offset(), request.page_size()).await?;
///     Ok::<_, FetchError>(rows)
/// };
/// ```
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    /// Fetch the rows for `request`.
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<T>, FetchError>;
}

#[async_trait]
impl<T, F, Fut> PageFetcher<T> for F
where
    T: Send + 'static,
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<T>, FetchError> {
        (self)(request).await
    }
}

/// Progress of the page fetches started by a data source.
///
/// Fetches are not serialized, so several may be in flight at once.
#[derive(Debug, Clone, Default)]
pub enum FetchState {
    /// No fetch has started yet.
    #[default]
    Idle,
    /// At least one fetch is in flight.
    Loading {
        /// Number of fetches in flight.
        in_flight: usize,
    },
    /// Nothing is in flight and the last fetch to finish succeeded.
    Ready(PageRequest),
    /// Nothing is in flight and the last fetch to finish failed. The
    /// dataset was left untouched.
    Failed(PageFetchFailure),
}

impl FetchState {
    /// Check if a fetch is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Check if the last fetch succeeded
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Check if the last fetch failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Get the failure if present
    pub fn as_failure(&self) -> Option<&PageFetchFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}
