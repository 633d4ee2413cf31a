use collation::CollationError;
use model::{filter::FilterError, records::field::ContactField};
use std::fmt;
use thiserror::Error;

/// Why a step was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalReason {
    /// The cursor already sits on the sentinel in the requested direction.
    EndOfList,
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefusalReason::EndOfList => f.write_str("end of list"),
        }
    }
}

/// Errors surfaced by cursor operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// Bad sort spec, bad filter or bad alphabet index. Not retried.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The caller's view of the store is stale. Wait for a refresh and
    /// reissue the same request.
    #[error("Cursor out of sync with store (store revision {revision})")]
    OutOfSync { revision: String },

    #[error("Query refused: {reason}")]
    QueryRefused { reason: RefusalReason },

    /// The field exists but its values cannot be collated.
    #[error("Field '{field}' is not supported for sorting")]
    NotSupported { field: ContactField },

    #[error("Operation cancelled")]
    Cancelled,

    /// Failure of the underlying store for this call only.
    #[error("Store error: {0}")]
    Store(String),

    /// The store-side cursor is gone.
    #[error("Cursor service disconnected")]
    Disconnected,
}

impl CursorError {
    pub fn end_of_list() -> Self {
        CursorError::QueryRefused {
            reason: RefusalReason::EndOfList,
        }
    }

    pub fn is_out_of_sync(&self) -> bool {
        matches!(self, CursorError::OutOfSync { .. })
    }
}

impl From<FilterError> for CursorError {
    fn from(err: FilterError) -> Self {
        CursorError::InvalidQuery(err.to_string())
    }
}

impl From<CollationError> for CursorError {
    fn from(err: CollationError) -> Self {
        match err {
            CollationError::RegistryPoisoned => CursorError::Store(err.to_string()),
            other => CursorError::InvalidQuery(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum RecordLogError {
    #[error("Failed to open record log: {0}")]
    Open(String),

    #[error("Failed to write record log: {0}")]
    Write(String),

    #[error("Failed to read record log: {0}")]
    Read(String),
}

impl From<RecordLogError> for CursorError {
    fn from(err: RecordLogError) -> Self {
        CursorError::Store(err.to_string())
    }
}
