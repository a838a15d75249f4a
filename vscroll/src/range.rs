//! Rendered index ranges and range slicing.

use crate::error::{Error, Result};

/// A half-open interval `[start, end)` of row indices.
///
/// The viewport reports one of these for the rows it currently wants
/// rendered. A rendered range that has not been measured yet is represented
/// as `Option::<ListRange>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ListRange {
    start: usize,
    end: usize,
}

impl ListRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The empty range at index 0.
    pub const fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Build a range from bounds that are already known to be ordered.
    pub(crate) fn from_ordered(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "unordered range {start}..{end}");
        Self {
            start,
            end: end.max(start),
        }
    }

    /// First index in the range.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last index in the range.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of indices covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the range covers no indices.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `index` lies inside the range.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Pixel offset of the first rendered row for rows of `item_size`.
    ///
    /// Hosts use this to translate sticky headers along with the rendered
    /// content.
    pub fn offset(&self, item_size: u32) -> u64 {
        (self.start as u64).saturating_mul(u64::from(item_size))
    }

    /// The range clamped to a dataset of `len` rows.
    pub fn clamp_to(&self, len: usize) -> Self {
        let end = self.end.min(len);
        Self {
            start: self.start.min(end),
            end,
        }
    }
}

impl From<ListRange> for std::ops::Range<usize> {
    fn from(range: ListRange) -> Self {
        range.start..range.end
    }
}

impl std::fmt::Display for ListRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Axis along which a viewport scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

/// Slice `data` to the rendered range.
///
/// An unset range (`None`) renders the whole dataset so the first frame is
/// never empty. A measured range is applied exactly, clamped to the data.
pub fn slice_to_range<T: Clone>(data: &[T], range: Option<ListRange>) -> Vec<T> {
    match range {
        None => data.to_vec(),
        Some(range) => {
            let range = range.clamp_to(data.len());
            data[range.start..range.end].to_vec()
        }
    }
}
