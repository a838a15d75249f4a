//! Table container: the authoritative dataset plus optional sort and filter.

mod sort;

pub use sort::{Filter, Sort, SortDirection};

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use tokio::sync::watch;

use crate::source::DataSource;
use crate::stream::{DataPublisher, DataStream};

/// Internal state for the table container.
#[derive(Debug)]
struct TableInner<T> {
    /// The dataset as last assigned.
    data: Arc<Vec<T>>,
    /// Active sort, applied after the filter.
    sort: Option<Sort<T>>,
    /// Active filter.
    filter: Option<Filter<T>>,
}

impl<T: Clone> TableInner<T> {
    /// Apply filter then sort to the dataset.
    fn render(&self) -> Arc<Vec<T>> {
        if self.sort.is_none() && self.filter.is_none() {
            return Arc::clone(&self.data);
        }
        let mut rows: Vec<T> = match &self.filter {
            Some(filter) => self
                .data
                .iter()
                .filter(|row| filter.matches(row))
                .cloned()
                .collect(),
            None => self.data.as_ref().clone(),
        };
        if let Some(sort) = &self.sort {
            sort.apply(&mut rows);
        }
        Arc::new(rows)
    }
}

/// Holds a dataset and emits it, sorted and filtered, on every assignment.
///
/// Cheap to clone; clones share the same dataset and output.
///
/// # Example
///
/// ```
/// use vscroll::table::{Sort, TableDataSource};
///
/// let table = TableDataSource::new(vec![3, 1, 2]);
/// table.set_sort(Some(Sort::by_key(|n: &i32| *n)));
///
/// assert_eq!(*table.rendered(), vec![1, 2, 3]);
/// assert_eq!(*table.data(), vec![3, 1, 2]);
/// ```
#[derive(Debug)]
pub struct TableDataSource<T> {
    inner: Arc<RwLock<TableInner<T>>>,
    rendered: Arc<DataPublisher<T>>,
    length: Arc<watch::Sender<usize>>,
}

impl<T> TableDataSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a container holding `data`.
    pub fn new(data: Vec<T>) -> Self {
        let inner = TableInner {
            data: Arc::new(data),
            sort: None,
            filter: None,
        };
        let rendered = DataPublisher::new(Vec::new());
        rendered.publish(inner.render());
        let (length, _) = watch::channel(inner.data.len());
        Self {
            inner: Arc::new(RwLock::new(inner)),
            rendered: Arc::new(rendered),
            length: Arc::new(length),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableInner<T>> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::warn!("table state lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Re-render and publish. Called with the write lock held so emissions
    /// follow assignment order.
    fn emit(&self, guard: &TableInner<T>) {
        let rendered = guard.render();
        let len = rendered.len();
        self.rendered.publish(rendered);
        self.length.send_if_modified(|current| {
            if *current == len {
                false
            } else {
                *current = len;
                true
            }
        });
        log::trace!("table emitted {} of {} rows", len, guard.data.len());
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Replace the dataset.
    pub fn set_data(&self, data: Vec<T>) {
        let mut guard = self.write();
        guard.data = Arc::new(data);
        self.emit(&guard);
    }

    /// The dataset as last assigned, before sort and filter.
    pub fn data(&self) -> Arc<Vec<T>> {
        self.inner
            .read()
            .map(|g| Arc::clone(&g.data))
            .unwrap_or_else(|poisoned| Arc::clone(&poisoned.into_inner().data))
    }

    /// Modify the dataset in place and re-emit.
    ///
    /// Readers holding a previous [`data`](Self::data) snapshot keep their
    /// copy; the closure works on a private one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<T>),
    {
        let mut guard = self.write();
        f(Arc::make_mut(&mut guard.data));
        self.emit(&guard);
    }

    /// Number of rows in the dataset.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Sort and filter
    // -------------------------------------------------------------------------

    /// Set or clear the sort.
    pub fn set_sort(&self, sort: Option<Sort<T>>) {
        let mut guard = self.write();
        guard.sort = sort;
        self.emit(&guard);
    }

    /// Get the current sort.
    pub fn sort(&self) -> Option<Sort<T>> {
        self.inner.read().ok().and_then(|g| g.sort.clone())
    }

    /// Flip the direction of the current sort.
    ///
    /// Returns the new direction, or `None` if no sort is set.
    pub fn toggle_sort(&self) -> Option<SortDirection> {
        let mut guard = self.write();
        let toggled = guard.sort.as_ref()?.toggled();
        let direction = toggled.direction();
        guard.sort = Some(toggled);
        self.emit(&guard);
        Some(direction)
    }

    /// Set or clear the filter.
    pub fn set_filter(&self, filter: Option<Filter<T>>) {
        let mut guard = self.write();
        guard.filter = filter;
        self.emit(&guard);
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    /// The current sorted and filtered rows.
    pub fn rendered(&self) -> Arc<Vec<T>> {
        self.rendered.current()
    }

    /// Length of the sorted and filtered rows, updated on change.
    pub fn rendered_len(&self) -> watch::Receiver<usize> {
        self.length.subscribe()
    }
}

impl<T> DataSource<T> for TableDataSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn connect(&self) -> DataStream<T> {
        self.rendered.subscribe()
    }

    fn disconnect(&self) {}
}

impl<T> Clone for TableDataSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            rendered: Arc::clone(&self.rendered),
            length: Arc::clone(&self.length),
        }
    }
}

impl<T> Default for TableDataSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
