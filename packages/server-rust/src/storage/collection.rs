//! Document collection trait: the storage collaborator of the record store.
//!
//! Defines [`DocumentCollection`], the abstraction over a single logical
//! collection in a document database. The [`RecordStore`](super::RecordStore)
//! issues exactly one collection call per step of each operation; engines
//! decide how documents are actually kept.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use todo_core::{Document, Filter, UpdateSpec};

/// Lazy, single-pass sequence of documents produced by [`DocumentCollection::find`].
pub type DocumentStream = BoxStream<'static, Result<Document, CollectionError>>;

/// Counts reported by [`DocumentCollection::update_one`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents selected by the filter (0 or 1).
    pub matched: u64,
    /// Documents whose stored values actually changed (0 or 1).
    pub modified: u64,
}

/// Errors reported by a collection engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// A write would violate a unique index.
    #[error("duplicate value '{value}' for unique field '{field}'")]
    DuplicateKey { field: String, value: String },
    /// The backing store could not be reached or rejected the command.
    #[error("collection unavailable: {0}")]
    Unavailable(String),
}

/// A single logical collection of documents.
///
/// Every method is atomic with respect to a single document. Implementations
/// must be safe to share across request tasks.
///
/// Used as `Arc<dyn DocumentCollection>`.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Short engine name for health reporting (e.g. `"memory"`).
    fn engine(&self) -> &'static str;

    /// Insert one document.
    ///
    /// Fails with [`CollectionError::DuplicateKey`] when a unique index rejects it.
    async fn insert_one(&self, document: Document) -> Result<(), CollectionError>;

    /// Stream every document matching `filter`, or every document when `None`.
    ///
    /// Order is the engine's natural order and carries no guarantee.
    async fn find(&self, filter: Option<&Filter>) -> Result<DocumentStream, CollectionError>;

    /// First document matching `filter`, if any.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CollectionError>;

    /// Merge `update` into the first document matching `filter`.
    async fn update_one(
        &self,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> Result<UpdateOutcome, CollectionError>;

    /// Remove the first document matching `filter`. Returns the number removed.
    async fn delete_one(&self, filter: &Filter) -> Result<u64, CollectionError>;

    /// Enforce uniqueness of `field` from now on.
    ///
    /// Idempotent. Fails with [`CollectionError::DuplicateKey`] if existing
    /// documents already violate the constraint.
    async fn ensure_unique_index(&self, field: &str) -> Result<(), CollectionError>;
}
