//! Test engine whose every call hangs forever.

use std::future::pending;

use async_trait::async_trait;
use todo_core::{Document, Filter, UpdateSpec};

use crate::storage::collection::{
    CollectionError, DocumentCollection, DocumentStream, UpdateOutcome,
};

/// Collection that never answers.
pub struct StalledCollection;

#[async_trait]
impl DocumentCollection for StalledCollection {
    fn engine(&self) -> &'static str {
        "stalled"
    }
    async fn insert_one(&self, _document: Document) -> Result<(), CollectionError> {
        pending().await
    }
    async fn find(&self, _filter: Option<&Filter>) -> Result<DocumentStream, CollectionError> {
        pending().await
    }
    async fn find_one(&self, _filter: &Filter) -> Result<Option<Document>, CollectionError> {
        pending().await
    }
    async fn update_one(
        &self,
        _filter: &Filter,
        _update: &UpdateSpec,
    ) -> Result<UpdateOutcome, CollectionError> {
        pending().await
    }
    async fn delete_one(&self, _filter: &Filter) -> Result<u64, CollectionError> {
        pending().await
    }
    async fn ensure_unique_index(&self, _field: &str) -> Result<(), CollectionError> {
        pending().await
    }
}
