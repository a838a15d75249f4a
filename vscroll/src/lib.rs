//! Virtual scrolling data source
//!
//! Feeds a fixed-row-height viewport only the rows it renders. A
//! [`VirtualDataSource`] joins a dataset, held in a sortable and filterable
//! [`TableDataSource`](table::TableDataSource), with the range reported by a
//! viewport, and can replace the dataset with pages fetched on request.

pub mod adapter;
pub mod error;
pub mod fetch;
pub mod paginator;
pub mod range;
pub mod source;
pub mod stream;
pub mod table;
pub mod viewport;

pub use adapter::VirtualDataSource;
pub use error::{Error, Result};

pub mod prelude {
    pub use crate::adapter::{PaginationConfig, SourceConfig, VirtualDataSource};
    pub use crate::error::{Error, FetchError, PageFetchFailure, Result};
    pub use crate::fetch::{FetchState, PageFetcher};
    pub use crate::paginator::{PageRequest, Paginator};
    pub use crate::range::{ListRange, Orientation};
    pub use crate::source::{DataSource, RangeSource, Repeater};
    pub use crate::stream::DataStream;
    pub use crate::table::{Filter, Sort, SortDirection, TableDataSource};
    pub use crate::viewport::{FixedSizeViewport, ViewportConfig};
}
