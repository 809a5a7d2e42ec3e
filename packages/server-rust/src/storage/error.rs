//! Errors returned by [`RecordStore`](super::RecordStore) operations.

use todo_core::RecordError;

use super::collection::CollectionError;

/// Outcome of a failed record store operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Insert attempted with an identifier that is already stored.
    #[error("record '{id}' already exists")]
    AlreadyExists { id: String },
    /// Update or delete attempted with an identifier that is not stored.
    #[error("record '{id}' not found")]
    NotFound { id: String },
    /// Update matched the record but no field value changed.
    #[error("record '{id}' was not modified")]
    NotModified { id: String },
    /// The backing collection could not be reached or timed out.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
    /// A stored document could not be decoded into a record.
    #[error("stored document is invalid: {0}")]
    Decode(#[from] RecordError),
}

impl From<CollectionError> for StoreError {
    fn from(err: CollectionError) -> Self {
        match err {
            // Only the identifier carries a unique index, so any engine-level
            // duplicate is a duplicate record.
            CollectionError::DuplicateKey { value, .. } => StoreError::AlreadyExists { id: value },
            CollectionError::Unavailable(reason) => StoreError::Unavailable { reason },
        }
    }
}
