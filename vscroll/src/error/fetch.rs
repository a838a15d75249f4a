//! Page fetch error types

use crate::paginator::PageRequest;

/// Error returned by a [`PageFetcher`](crate::fetch::PageFetcher).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    /// Error message
    pub message: String,
}

impl FetchError {
    /// Create a new fetch error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<String> for FetchError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for FetchError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// A failed fetch together with the page it was fetching.
///
/// Published on the data source's error channel. The dataset is left
/// untouched when a fetch fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to fetch {request}: {error}")]
pub struct PageFetchFailure {
    /// The request that failed.
    pub request: PageRequest,
    /// The fetcher's error.
    pub error: FetchError,
}

impl PageFetchFailure {
    /// Creates a new failure record.
    pub fn new(request: PageRequest, error: FetchError) -> Self {
        Self { request, error }
    }
}
