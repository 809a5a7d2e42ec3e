//! In-memory [`DocumentCollection`] engine.
//!
//! [`MemoryCollection`] keeps documents in insertion order behind a single
//! `parking_lot` lock, so uniqueness checks and writes happen atomically.
//! [`MemoryDatabase`] hands out named collections backed by [`DashMap`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use parking_lot::RwLock;
use todo_core::{Document, Filter, UpdateSpec};

use crate::storage::collection::{
    CollectionError, DocumentCollection, DocumentStream, UpdateOutcome,
};

#[derive(Debug, Default)]
struct CollectionState {
    next_seq: u64,
    /// Keyed by insertion sequence, which is the natural iteration order.
    documents: BTreeMap<u64, Document>,
    unique_fields: BTreeSet<String>,
}

impl CollectionState {
    fn first_match(&self, filter: &Filter) -> Option<u64> {
        self.documents
            .iter()
            .find(|(_, doc)| filter.matches(doc))
            .map(|(seq, _)| *seq)
    }

    /// Checks `candidate` against every unique field, skipping the document at `skip`.
    fn check_unique(&self, candidate: &Document, skip: Option<u64>) -> Result<(), CollectionError> {
        for field in &self.unique_fields {
            let Some(value) = candidate.get(field) else {
                continue;
            };
            let clash = self
                .documents
                .iter()
                .any(|(seq, doc)| Some(*seq) != skip && doc.get(field) == Some(value));
            if clash {
                return Err(CollectionError::DuplicateKey {
                    field: field.clone(),
                    value: value.to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// In-memory collection for development and tests.
///
/// Documents are kept in insertion order. `find` returns a snapshot taken at
/// call time, so concurrent writes never disturb an open stream.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    state: RwLock<CollectionState>,
}

impl MemoryCollection {
    /// Creates an empty collection with no unique indexes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn insert_one(&self, document: Document) -> Result<(), CollectionError> {
        let mut state = self.state.write();
        state.check_unique(&document, None)?;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.documents.insert(seq, document);
        Ok(())
    }

    async fn find(&self, filter: Option<&Filter>) -> Result<DocumentStream, CollectionError> {
        let snapshot: Vec<Document> = {
            let state = self.state.read();
            state
                .documents
                .values()
                .filter(|doc| filter.map_or(true, |f| f.matches(doc)))
                .cloned()
                .collect()
        };
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CollectionError> {
        let state = self.state.read();
        Ok(state
            .first_match(filter)
            .and_then(|seq| state.documents.get(&seq).cloned()))
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> Result<UpdateOutcome, CollectionError> {
        let mut state = self.state.write();
        let Some(seq) = state.first_match(filter) else {
            return Ok(UpdateOutcome::default());
        };

        let mut merged = state.documents[&seq].clone();
        if !update.apply_to(&mut merged) {
            return Ok(UpdateOutcome {
                matched: 1,
                modified: 0,
            });
        }
        state.check_unique(&merged, Some(seq))?;
        state.documents.insert(seq, merged);

        Ok(UpdateOutcome {
            matched: 1,
            modified: 1,
        })
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, CollectionError> {
        let mut state = self.state.write();
        let removed = state
            .first_match(filter)
            .and_then(|seq| state.documents.remove(&seq));
        Ok(u64::from(removed.is_some()))
    }

    async fn ensure_unique_index(&self, field: &str) -> Result<(), CollectionError> {
        let mut state = self.state.write();
        if state.unique_fields.contains(field) {
            return Ok(());
        }

        let mut seen = BTreeSet::new();
        for doc in state.documents.values() {
            if let Some(value) = doc.get(field) {
                if !seen.insert(value) {
                    return Err(CollectionError::DuplicateKey {
                        field: field.to_owned(),
                        value: value.to_owned(),
                    });
                }
            }
        }

        state.unique_fields.insert(field.to_owned());
        Ok(())
    }
}

/// Registry of named in-memory collections.
///
/// Asking for the same name twice yields the same collection, so every
/// handle opened in one process observes the same data.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    collections: DashMap<String, Arc<MemoryCollection>>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection called `name`, creating it on first use.
    #[must_use]
    pub fn collection(&self, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(MemoryCollection::new()))
            .clone()
    }

    /// Number of collections created so far.
    #[must_use]
    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }
}
