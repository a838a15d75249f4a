//! Pluggable sort and filter for the table container.

use std::cmp::Ordering;
use std::sync::Arc;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A comparator plus the direction to apply it in.
///
/// Sorting is stable: rows that compare equal keep their dataset order.
pub struct Sort<T> {
    compare: Comparator<T>,
    direction: SortDirection,
}

impl<T> Sort<T> {
    /// Sort ascending by `compare`.
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(compare),
            direction: SortDirection::Ascending,
        }
    }

    /// Sort ascending by the key `key` extracts.
    pub fn by_key<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(move |a, b| key(a).cmp(&key(b)))
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sort descending.
    pub fn descending(self) -> Self {
        self.with_direction(SortDirection::Descending)
    }

    /// The current direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// The same comparator in the opposite direction.
    pub fn toggled(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
            direction: self.direction.reversed(),
        }
    }

    pub(crate) fn apply(&self, rows: &mut [T]) {
        match self.direction {
            SortDirection::Ascending => rows.sort_by(|a, b| (self.compare)(a, b)),
            SortDirection::Descending => rows.sort_by(|a, b| (self.compare)(b, a)),
        }
    }
}

impl<T> Clone for Sort<T> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
            direction: self.direction,
        }
    }
}

impl<T> std::fmt::Debug for Sort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sort")
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

/// A row predicate. Rows for which it returns `false` are hidden.
pub struct Filter<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Filter<T> {
    /// Keep rows matching `predicate`.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Returns `true` if `row` passes the filter.
    pub fn matches(&self, row: &T) -> bool {
        (self.predicate)(row)
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> std::fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}
