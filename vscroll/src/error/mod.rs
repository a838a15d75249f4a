//! Error types

mod fetch;

pub use fetch::*;

/// Errors surfaced by the virtual data source and its collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A required collaborator was not provided.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),

    /// The operation is not supported by this data source.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A range whose start lies past its end.
    #[error("invalid range: start {start} is greater than end {end}")]
    InvalidRange {
        /// First index of the range.
        start: usize,
        /// One past the last index of the range.
        end: usize,
    },

    /// A page request with a zero page size.
    #[error("invalid page size: {0}")]
    InvalidPageSize(usize),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
