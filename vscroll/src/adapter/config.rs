//! Data source configuration.

use std::sync::Arc;

use futures::stream::{BoxStream, Stream, StreamExt};

use crate::fetch::PageFetcher;
use crate::paginator::{PageRequest, Paginator};

/// Default capacity of the fetch error channel.
pub const DEFAULT_ERROR_CAPACITY: usize = 16;

/// Behaviour settings for a [`VirtualDataSource`](super::VirtualDataSource).
///
/// # Example
///
/// ```
/// use vscroll::adapter::SourceConfig;
/// use vscroll::paginator::PageRequest;
///
/// let config = SourceConfig::default()
///     .with_initial_page(PageRequest::new(0, 50)?)
///     .with_error_capacity(4);
/// assert_eq!(config.error_capacity, 4);
/// # Ok::<(), vscroll::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Page to fetch as soon as the source is built.
    ///
    /// Ignored without pagination. Default: none
    pub fetch_initial_page: Option<PageRequest>,

    /// Fetch failures buffered per error subscriber before the oldest are
    /// dropped.
    ///
    /// Default: 16
    pub error_capacity: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fetch_initial_page: None,
            error_capacity: DEFAULT_ERROR_CAPACITY,
        }
    }
}

impl SourceConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch `request` when the source is built.
    pub fn with_initial_page(mut self, request: PageRequest) -> Self {
        self.fetch_initial_page = Some(request);
        self
    }

    /// Sets the error channel capacity. Zero is treated as one.
    pub fn with_error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity.max(1);
        self
    }
}

/// Where page requests come from and how pages are fetched.
pub struct PaginationConfig<T> {
    pub(crate) requests: BoxStream<'static, PageRequest>,
    pub(crate) fetcher: Arc<dyn PageFetcher<T>>,
}

impl<T> PaginationConfig<T>
where
    T: Send + 'static,
{
    /// Fetch a page with `fetcher` for every request `requests` yields.
    pub fn new<S, F>(requests: S, fetcher: F) -> Self
    where
        S: Stream<Item = PageRequest> + Send + 'static,
        F: PageFetcher<T> + 'static,
    {
        Self {
            requests: requests.boxed(),
            fetcher: Arc::new(fetcher),
        }
    }

    /// Follow the requests of `paginator`.
    pub fn from_paginator<F>(paginator: &Paginator, fetcher: F) -> Self
    where
        F: PageFetcher<T> + 'static,
    {
        Self::new(paginator.page_requests(), fetcher)
    }
}

impl<T> std::fmt::Debug for PaginationConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationConfig").finish_non_exhaustive()
    }
}
