//! Builder for [`VirtualDataSource`].

use std::sync::{Arc, Weak};

use tokio::runtime::Handle;

use super::config::{PaginationConfig, SourceConfig};
use super::pagination::{FetchTracker, PageLoader};
use super::{SourceId, VirtualDataSource};
use crate::error::{Error, Result};
use crate::source::{RangeSource, Repeater};
use crate::table::TableDataSource;

/// Configures and builds a [`VirtualDataSource`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vscroll::adapter::VirtualDataSource;
/// use vscroll::viewport::{FixedSizeViewport, ViewportConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> vscroll::Result<()> {
/// let viewport = Arc::new(FixedSizeViewport::new(ViewportConfig::default()));
/// let source = VirtualDataSource::builder()
///     .viewport(viewport)
///     .data(vec!["a", "b", "c"])
///     .build()?;
///
/// assert_eq!(source.current_data().len(), 3);
/// # Ok(())
/// # }
/// ```
pub struct VirtualDataSourceBuilder<T> {
    viewport: Option<Arc<dyn RangeSource>>,
    data: Vec<T>,
    pagination: Option<PaginationConfig<T>>,
    config: SourceConfig,
}

impl<T> VirtualDataSourceBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(super) fn new() -> Self {
        Self {
            viewport: None,
            data: Vec::new(),
            pagination: None,
            config: SourceConfig::default(),
        }
    }

    /// The viewport whose rendered range selects the visible rows. Required.
    pub fn viewport(mut self, viewport: Arc<dyn RangeSource>) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Initial dataset.
    pub fn data(mut self, data: Vec<T>) -> Self {
        self.data = data;
        self
    }

    /// Replace the dataset with a fetched page on every page request.
    pub fn pagination(mut self, pagination: PaginationConfig<T>) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn config(mut self, config: SourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the data source and attach it to the viewport.
    ///
    /// Fails with [`Error::Precondition`] when no viewport was given, or
    /// when called outside a tokio runtime.
    pub fn build(self) -> Result<Arc<VirtualDataSource<T>>> {
        let viewport = self
            .viewport
            .ok_or(Error::Precondition("a viewport is required to build a virtual data source"))?;
        let runtime = Handle::try_current()
            .map_err(|_| Error::Precondition("a virtual data source requires a running tokio runtime"))?;

        let id = SourceId::new();
        let table = TableDataSource::new(self.data);
        let tracker = Arc::new(FetchTracker::new(self.config.error_capacity));
        let source = Arc::new_cyclic(|source: &Weak<VirtualDataSource<T>>| {
            VirtualDataSource::from_parts(
                id,
                table.clone(),
                Arc::clone(&viewport),
                source.clone() as Weak<dyn Repeater>,
                runtime.clone(),
                Arc::clone(&tracker),
            )
        });

        viewport.attach(source.repeater.clone());
        log::debug!("{} attached to viewport", id);

        match self.pagination {
            Some(pagination) => {
                let loader = PageLoader {
                    fetcher: pagination.fetcher,
                    table,
                    tracker,
                    token: source.subscriptions.token(),
                };
                if let Some(request) = self.config.fetch_initial_page {
                    let _guard = runtime.enter();
                    loader.spawn_fetch(request);
                }
                let task = runtime.spawn(loader.run(pagination.requests));
                source.subscriptions.add(task);
                log::debug!("{} listening for page requests", id);
            }
            None => {
                if let Some(request) = self.config.fetch_initial_page {
                    log::warn!("{} has no pagination, not fetching initial {}", id, request);
                }
            }
        }

        Ok(source)
    }
}

impl<T> std::fmt::Debug for VirtualDataSourceBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualDataSourceBuilder")
            .field("has_viewport", &self.viewport.is_some())
            .field("rows", &self.data.len())
            .field("pagination", &self.pagination.is_some())
            .field("config", &self.config)
            .finish()
    }
}
