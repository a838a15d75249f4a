//! The virtual data source: joins a dataset with a viewport's rendered
//! range into the slice of rows to render.
//!
//! Three independently changing inputs meet here. The dataset lives in a
//! [`TableDataSource`], the rendered range comes from a [`RangeSource`] and
//! page requests, when configured, replace the dataset through a
//! [`PageFetcher`](crate::fetch::PageFetcher). [`VirtualDataSource::connect`]
//! recomputes the visible slice whenever the dataset or the range changes,
//! using the newest value of the other.

mod builder;
mod config;
mod pagination;
mod subscriptions;

pub use builder::VirtualDataSourceBuilder;
pub use config::{DEFAULT_ERROR_CAPACITY, PaginationConfig, SourceConfig};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard, Weak};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, PageFetchFailure, Result};
use crate::fetch::FetchState;
use crate::range::{ListRange, Orientation, slice_to_range};
use crate::source::{DataSource, RangeSource, Repeater};
use crate::stream::{DataPublisher, DataStream};
use crate::table::TableDataSource;

use pagination::FetchTracker;
use subscriptions::Subscriptions;

/// Unique identifier for a data source instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

impl SourceId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "virtual-source-{}", self.0)
    }
}

/// Output state of the join.
#[derive(Debug)]
enum Output<T> {
    /// `connect` has not been called.
    Idle,
    /// The join task is running and publishing here.
    Live(Arc<DataPublisher<T>>),
    /// Disconnected. Holds the last slice.
    Closed(Arc<Vec<T>>),
}

/// Feeds a viewport the rows inside its rendered range.
///
/// Built with [`VirtualDataSource::builder`]. Building attaches the source
/// to its viewport as the repeater, so the viewport can report ranges and
/// read the data length right away. Background work runs on the tokio
/// runtime the source was built in.
///
/// While the viewport has not measured itself the whole dataset is visible.
/// Once a range is known the visible slice is exactly the rows in
/// `[start, end)`, clamped to the dataset.
///
/// Mutations go through [`set_data`](Self::set_data),
/// [`replace`](Self::replace) or [`update_data`](Self::update_data). Every
/// one of them re-emits, even when the rows compare equal.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vscroll::adapter::VirtualDataSource;
/// use vscroll::range::ListRange;
/// use vscroll::viewport::{FixedSizeViewport, ViewportConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> vscroll::Result<()> {
/// let viewport = Arc::new(FixedSizeViewport::new(ViewportConfig::default()));
/// let source = VirtualDataSource::builder()
///     .viewport(viewport.clone())
///     .data((0..100).collect::<Vec<u32>>())
///     .build()?;
///
/// let mut visible = source.connect();
/// viewport.set_rendered_range(ListRange::new(10, 13)?);
///
/// let slice = visible.wait_for(|rows| rows == [10, 11, 12]).await;
/// assert!(slice.is_some());
///
/// source.disconnect();
/// # Ok(())
/// # }
/// ```
pub struct VirtualDataSource<T> {
    id: SourceId,
    table: TableDataSource<T>,
    viewport: Arc<dyn RangeSource>,
    /// This source as the viewport sees it.
    repeater: Weak<dyn Repeater>,
    runtime: Handle,
    output: RwLock<Output<T>>,
    subscriptions: Subscriptions,
    fetches: Arc<FetchTracker>,
}

impl<T> VirtualDataSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start building a data source.
    pub fn builder() -> VirtualDataSourceBuilder<T> {
        VirtualDataSourceBuilder::new()
    }

    fn from_parts(
        id: SourceId,
        table: TableDataSource<T>,
        viewport: Arc<dyn RangeSource>,
        repeater: Weak<dyn Repeater>,
        runtime: Handle,
        fetches: Arc<FetchTracker>,
    ) -> Self {
        Self {
            id,
            table,
            viewport,
            repeater,
            runtime,
            output: RwLock::new(Output::Idle),
            subscriptions: Subscriptions::new(),
            fetches,
        }
    }

    fn output_mut(&self) -> RwLockWriteGuard<'_, Output<T>> {
        self.output.write().unwrap_or_else(|poisoned| {
            log::warn!("{} output lock poisoned, recovering", self.id);
            PoisonError::into_inner(poisoned)
        })
    }

    /// Identifier used in log messages.
    pub fn id(&self) -> SourceId {
        self.id
    }

    // -------------------------------------------------------------------------
    // Connection
    // -------------------------------------------------------------------------

    /// Return a live view of the visible slice.
    ///
    /// The first call computes the slice for the current dataset and range,
    /// then starts following both. Later calls return another view of the
    /// same slice. After [`disconnect`](Self::disconnect) the returned view is
    /// closed and holds the last slice.
    pub fn connect(&self) -> DataStream<T> {
        let mut output = self.output_mut();
        match &*output {
            Output::Live(publisher) => return publisher.subscribe(),
            Output::Closed(last) => return DataStream::closed(Arc::clone(last)),
            Output::Idle => {}
        }

        let data = self.table.connect();
        let ranges = self.viewport.rendered_range();
        let range = *ranges.borrow();
        let publisher = Arc::new(DataPublisher::new(slice_to_range(&data.current(), range)));
        let stream = publisher.subscribe();

        let task = self.runtime.spawn(join_latest(
            self.id,
            data,
            ranges,
            Arc::downgrade(&publisher),
            self.subscriptions.token(),
        ));
        self.subscriptions.add(task);

        log::debug!("{} connected, initial range {:?}", self.id, range);
        *output = Output::Live(publisher);
        stream
    }

    /// Stop every task this source started and close the visible slice
    /// stream.
    ///
    /// Safe to call more than once, and without a prior
    /// [`connect`](Self::connect).
    pub fn disconnect(&self) {
        let mut output = self.output_mut();
        if !self.subscriptions.close() {
            log::trace!("{} already disconnected", self.id);
            return;
        }
        let last = match std::mem::replace(&mut *output, Output::Idle) {
            Output::Live(publisher) => publisher.current(),
            Output::Closed(last) => last,
            Output::Idle => Arc::new(self.visible_slice()),
        };
        *output = Output::Closed(last);
        drop(output);

        self.viewport.detach(&self.repeater);
        log::debug!("{} disconnected", self.id);
    }

    /// Returns `true` while the visible slice is being followed.
    pub fn is_connected(&self) -> bool {
        matches!(
            *self.output.read().unwrap_or_else(PoisonError::into_inner),
            Output::Live(_)
        )
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Replace the dataset with a copy of `data`.
    pub fn set_data(&self, data: &[T]) {
        self.replace(data.to_vec());
    }

    /// Replace the dataset, taking ownership of `data`.
    pub fn replace(&self, data: Vec<T>) {
        log::trace!("{} replacing dataset with {} rows", self.id, data.len());
        self.table.set_data(data);
    }

    /// Modify a copy of the dataset and replace the dataset with it.
    ///
    /// Snapshots returned earlier by [`current_data`](Self::current_data)
    /// are not affected.
    pub fn update_data<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<T>),
    {
        self.table.update(f);
    }

    /// The dataset as last assigned, before sort and filter.
    pub fn current_data(&self) -> Arc<Vec<T>> {
        self.table.data()
    }

    /// The sorted and filtered dataset, not sliced to the rendered range.
    pub fn data_stream(&self) -> DataStream<T> {
        self.table.connect()
    }

    /// The table holding the dataset, for sort and filter control.
    pub fn table(&self) -> &TableDataSource<T> {
        &self.table
    }

    /// The visible slice for the current dataset and range, computed now.
    pub fn visible_slice(&self) -> Vec<T> {
        let range = *self.viewport.rendered_range().borrow();
        slice_to_range(&self.table.rendered(), range)
    }

    /// The viewport's current rendered range.
    pub fn rendered_range(&self) -> Option<ListRange> {
        *self.viewport.rendered_range().borrow()
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    /// Progress of page fetches.
    pub fn fetch_state(&self) -> watch::Receiver<FetchState> {
        self.fetches.state()
    }

    /// Failed page fetches from now on.
    pub fn fetch_errors(&self) -> broadcast::Receiver<PageFetchFailure> {
        self.fetches.errors()
    }

    /// Returns `true` while at least one page fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.fetches.in_flight() > 0
    }
}

/// Recompute the visible slice whenever the data or the range changes.
async fn join_latest<T>(
    id: SourceId,
    mut data: DataStream<T>,
    mut ranges: watch::Receiver<Option<ListRange>>,
    output: Weak<DataPublisher<T>>,
    token: CancellationToken,
) where
    T: Clone + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            changed = data.changed() => {
                if changed.is_none() {
                    log::debug!("{} dataset closed", id);
                    break;
                }
            }
            changed = ranges.changed() => {
                if changed.is_err() {
                    log::debug!("{} viewport closed", id);
                    break;
                }
            }
        }

        let rows = data.current();
        let range = *ranges.borrow_and_update();
        let Some(publisher) = output.upgrade() else {
            break;
        };
        let slice = slice_to_range(&rows, range);
        log::trace!("{} visible slice {} of {} rows, range {:?}", id, slice.len(), rows.len(), range);
        publisher.publish(Arc::new(slice));
    }
    log::trace!("{} join stopped", id);
}

impl<T> DataSource<T> for VirtualDataSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn connect(&self) -> DataStream<T> {
        VirtualDataSource::connect(self)
    }

    fn disconnect(&self) {
        VirtualDataSource::disconnect(self)
    }
}

impl<T> Repeater for VirtualDataSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn data_length(&self) -> watch::Receiver<usize> {
        self.table.rendered_len()
    }

    /// Rows have a fixed size, so there is nothing to measure.
    fn measure_range_size(&self, _range: ListRange, _orientation: Orientation) -> Result<f64> {
        Err(Error::Unsupported(
            "measure_range_size is not supported with fixed size rows",
        ))
    }
}

impl<T> Drop for VirtualDataSource<T> {
    fn drop(&mut self) {
        if self.subscriptions.close() {
            log::debug!("{} dropped while connected", self.id);
        }
    }
}

impl<T> std::fmt::Debug for VirtualDataSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualDataSource")
            .field("id", &self.id)
            .field("closed", &self.subscriptions.is_closed())
            .field("tasks", &self.subscriptions.active())
            .finish_non_exhaustive()
    }
}
