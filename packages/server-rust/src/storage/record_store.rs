//! CRUD façade over a todo [`DocumentCollection`].
//!
//! [`RecordStore`] layers record semantics on top of a collection: identifier
//! uniqueness on insert, merge updates that must change something, and
//! deletion that must remove something. Documents are built with the
//! `todo_core` codec; every call round-trips to the collection under the
//! configured operation timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};
use todo_core::{
    encode_document, encode_filter, encode_update, Document, TodoField, TodoPatch, TodoRecord,
};
use tracing::{debug, warn};

use crate::storage::collection::{CollectionError, DocumentCollection, DocumentStream};
use crate::storage::config::StoreConfig;
use crate::storage::error::StoreError;

/// Lazy, single-pass sequence of records returned by [`RecordStore::find_all`].
pub type RecordStream = BoxStream<'static, Result<TodoRecord, StoreError>>;

fn timed_out(op: &str, timeout: Duration) -> StoreError {
    StoreError::Unavailable {
        reason: format!("{op} timed out after {}ms", timeout.as_millis()),
    }
}

/// Record store for todo records.
///
/// Shared across request handlers as `Arc<RecordStore>`; holds no record
/// state of its own.
pub struct RecordStore {
    collection: Arc<dyn DocumentCollection>,
    operation_timeout: Duration,
}

impl RecordStore {
    /// Wraps `collection` without touching it.
    #[must_use]
    pub fn new(collection: Arc<dyn DocumentCollection>, config: &StoreConfig) -> Self {
        Self {
            collection,
            operation_timeout: config.operation_timeout,
        }
    }

    /// Wraps `collection` and, if configured, makes the engine enforce a
    /// unique index on `Id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if stored documents already share
    /// an identifier, or [`StoreError::Unavailable`] if the engine cannot be
    /// reached.
    pub async fn open(
        collection: Arc<dyn DocumentCollection>,
        config: &StoreConfig,
    ) -> Result<Self, StoreError> {
        let store = Self::new(collection, config);
        if config.enforce_unique_id {
            let field = TodoField::Id.as_str();
            store
                .bounded("ensure_unique_index", store.collection.ensure_unique_index(field))
                .await?;
            debug!(field, "Unique index ensured");
        }
        Ok(store)
    }

    /// Engine name of the underlying collection.
    #[must_use]
    pub fn engine(&self) -> &'static str {
        self.collection.engine()
    }

    /// Runs one collection call under the operation timeout.
    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, CollectionError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_elapsed) => {
                warn!(op, timeout = ?self.operation_timeout, "Collection call timed out");
                Err(timed_out(op, self.operation_timeout))
            }
        }
    }

    /// Pulls the next document from a cursor under the operation timeout.
    async fn next_bounded(&self, cursor: &mut DocumentStream) -> Result<Option<Document>, StoreError> {
        self.bounded("cursor", async { cursor.next().await.transpose() })
            .await
    }

    /// Returns `true` if at least one record has `field == value`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the collection cannot be reached.
    pub async fn exists(&self, field: TodoField, value: &str) -> Result<bool, StoreError> {
        let filter = encode_filter(field.as_str(), value);
        let found = self
            .bounded("find_one", self.collection.find_one(&filter))
            .await?;
        Ok(found.is_some())
    }

    /// Inserts `record` unless its identifier is already stored.
    ///
    /// The existence check is an early exit only; a duplicate that slips past
    /// it is rejected by the engine's unique index and reported the same way.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] without writing when the
    /// identifier is taken, or [`StoreError::Unavailable`].
    pub async fn insert(&self, record: &TodoRecord) -> Result<(), StoreError> {
        if self.exists(TodoField::Id, &record.id).await? {
            debug!(id = %record.id, "Insert rejected, identifier present");
            return Err(StoreError::AlreadyExists {
                id: record.id.clone(),
            });
        }

        let document = encode_document(record.to_fields());
        match self
            .bounded("insert_one", self.collection.insert_one(document))
            .await
        {
            Ok(()) => {
                debug!(id = %record.id, "Record inserted");
                Ok(())
            }
            Err(StoreError::AlreadyExists { .. }) => {
                debug!(id = %record.id, "Insert lost a race, engine reported duplicate");
                Err(StoreError::AlreadyExists {
                    id: record.id.clone(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Streams every stored record in the engine's natural order.
    ///
    /// The stream is consumed once. Each cursor step runs under the operation
    /// timeout; the stream ends after the first error it yields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the query cannot be issued.
    pub async fn find_all(&self) -> Result<RecordStream, StoreError> {
        let cursor = self.bounded("find", self.collection.find(None)).await?;
        let timeout = self.operation_timeout;

        let records = stream::unfold(Some(cursor), move |state| async move {
            let mut cursor = state?;
            match tokio::time::timeout(timeout, cursor.next()).await {
                Ok(Some(Ok(document))) => {
                    let record = TodoRecord::from_document(&document).map_err(StoreError::from);
                    let next = if record.is_ok() { Some(cursor) } else { None };
                    Some((record, next))
                }
                Ok(Some(Err(err))) => Some((Err(StoreError::from(err)), None)),
                Ok(None) => None,
                Err(_elapsed) => Some((Err(timed_out("cursor", timeout)), None)),
            }
        });
        Ok(records.boxed())
    }

    /// Returns the record with identifier `id`, if stored.
    ///
    /// Should the backend hold several documents with that identifier, the
    /// first one is returned and the inconsistency is logged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`], or [`StoreError::Decode`] if the
    /// stored document lacks a field.
    pub async fn find_one(&self, id: &str) -> Result<Option<TodoRecord>, StoreError> {
        let filter = encode_filter(TodoField::Id.as_str(), id);
        let mut cursor = self.bounded("find", self.collection.find(Some(&filter))).await?;

        let Some(first) = self.next_bounded(&mut cursor).await? else {
            return Ok(None);
        };
        if self.next_bounded(&mut cursor).await?.is_some() {
            warn!(id, "Identifier matched more than one document; returning the first");
        }

        Ok(Some(TodoRecord::from_document(&first)?))
    }

    /// Merges `patch` into the record with identifier `id`.
    ///
    /// Succeeds only when at least one field value changes. A patch that
    /// assigns nothing, or only current values, is reported as
    /// [`StoreError::NotModified`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] without writing if `id` is absent,
    /// [`StoreError::NotModified`], or [`StoreError::Unavailable`].
    pub async fn update(&self, id: &str, patch: &TodoPatch) -> Result<(), StoreError> {
        if !self.exists(TodoField::Id, id).await? {
            debug!(id, "Update rejected, identifier absent");
            return Err(StoreError::NotFound { id: id.to_owned() });
        }

        let update = encode_update(patch.to_fields());
        if update.is_empty() {
            debug!(id, "Update carries no assignments");
            return Err(StoreError::NotModified { id: id.to_owned() });
        }

        let filter = encode_filter(TodoField::Id.as_str(), id);
        let outcome = self
            .bounded("update_one", self.collection.update_one(&filter, &update))
            .await?;

        match (outcome.matched, outcome.modified) {
            (0, _) => Err(StoreError::NotFound { id: id.to_owned() }),
            (_, 0) => Err(StoreError::NotModified { id: id.to_owned() }),
            _ => {
                debug!(id, fields = update.assignments().len(), "Record updated");
                Ok(())
            }
        }
    }

    /// Deletes the record with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing was deleted, or
    /// [`StoreError::Unavailable`].
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let filter = encode_filter(TodoField::Id.as_str(), id);
        let deleted = self
            .bounded("delete_one", self.collection.delete_one(&filter))
            .await?;

        if deleted == 0 {
            debug!(id, "Delete matched nothing");
            return Err(StoreError::NotFound { id: id.to_owned() });
        }
        debug!(id, "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures_util::TryStreamExt;
    use todo_core::{Filter, UpdateSpec};

    use super::*;
    use crate::storage::collection::UpdateOutcome;
    use crate::storage::engines::{MemoryCollection, StalledCollection};

    fn record(id: &str, first: &str, last: &str) -> TodoRecord {
        TodoRecord {
            id: id.into(),
            first_name: first.into(),
            last_name: last.into(),
            email_id: format!("{id}@example.com"),
            location: "X".into(),
        }
    }

    fn patch(field: TodoField, value: &str) -> TodoPatch {
        let mut patch = TodoPatch::default();
        patch.set(field, value);
        patch
    }

    async fn open_store() -> (RecordStore, Arc<MemoryCollection>) {
        let collection = Arc::new(MemoryCollection::new());
        let store = RecordStore::open(collection.clone(), &StoreConfig::default())
            .await
            .unwrap();
        (store, collection)
    }

    async fn all(store: &RecordStore) -> Vec<TodoRecord> {
        store.find_all().await.unwrap().try_collect().await.unwrap()
    }

    // --- Insert / find ---

    #[tokio::test]
    async fn insert_then_find_one_round_trips() {
        let (store, _) = open_store().await;
        let todo = TodoRecord {
            id: "T1".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            email_id: "a@b.com".into(),
            location: "X".into(),
        };

        store.insert(&todo).await.unwrap();

        assert_eq!(store.find_one("T1").await.unwrap(), Some(todo));
        assert!(store.exists(TodoField::Id, "T1").await.unwrap());
        assert!(store.exists(TodoField::EmailId, "a@b.com").await.unwrap());
    }

    #[tokio::test]
    async fn find_one_missing_is_none() {
        let (store, _) = open_store().await;
        assert_eq!(store.find_one("ghost").await.unwrap(), None);
        assert!(!store.exists(TodoField::Id, "ghost").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_insert_fails_and_keeps_original() {
        let (store, collection) = open_store().await;
        store.insert(&record("T1", "A", "B")).await.unwrap();

        let err = store.insert(&record("T1", "Other", "Name")).await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists { id: "T1".into() });

        assert_eq!(collection.len(), 1);
        let stored = store.find_one("T1").await.unwrap().unwrap();
        assert_eq!(stored.first_name, "A");
    }

    #[tokio::test]
    async fn repeated_inserts_leave_one_record_per_id() {
        let (store, _) = open_store().await;
        let ids = ["a", "b", "a", "c", "b", "a"];
        let mut rejected = 0;
        for id in ids {
            if store.insert(&record(id, "F", "L")).await.is_err() {
                rejected += 1;
            }
        }
        assert_eq!(rejected, 3);
        assert_eq!(all(&store).await.len(), 3);
    }

    #[tokio::test]
    async fn find_all_yields_every_inserted_record() {
        let (store, _) = open_store().await;
        let inserted: Vec<_> = (0..5)
            .map(|i| record(&format!("T{i}"), &format!("F{i}"), "L"))
            .collect();
        for todo in &inserted {
            store.insert(todo).await.unwrap();
        }

        let mut found = all(&store).await;
        found.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(found, inserted);
    }

    #[tokio::test]
    async fn find_all_on_empty_store_is_empty() {
        let (store, _) = open_store().await;
        assert!(all(&store).await.is_empty());
    }

    #[tokio::test]
    async fn find_all_stops_at_undecodable_document() {
        let (store, collection) = open_store().await;
        store.insert(&record("T1", "A", "B")).await.unwrap();
        collection
            .insert_one(encode_document([("Id", "broken")]))
            .await
            .unwrap();
        store.insert(&record("T3", "C", "D")).await.unwrap();

        let items: Vec<_> = store.find_all().await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn find_one_tolerates_duplicate_ids() {
        // No unique index: the backend can be driven into holding duplicates.
        let collection = Arc::new(MemoryCollection::new());
        let config = StoreConfig {
            enforce_unique_id: false,
            ..StoreConfig::default()
        };
        let store = RecordStore::open(collection.clone(), &config).await.unwrap();

        collection
            .insert_one(encode_document(record("T1", "first", "x").to_fields()))
            .await
            .unwrap();
        collection
            .insert_one(encode_document(record("T1", "second", "y").to_fields()))
            .await
            .unwrap();

        let found = store.find_one("T1").await.unwrap().unwrap();
        assert_eq!(found.first_name, "first");
    }

    #[tokio::test]
    async fn open_fails_when_ids_already_collide() {
        let collection = Arc::new(MemoryCollection::new());
        let doc = encode_document(record("T1", "A", "B").to_fields());
        collection.insert_one(doc.clone()).await.unwrap();
        collection.insert_one(doc).await.unwrap();

        let err = RecordStore::open(collection, &StoreConfig::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err, StoreError::AlreadyExists { id: "T1".into() });
    }

    // --- Update ---

    #[tokio::test]
    async fn update_merges_instead_of_replacing() {
        let (store, _) = open_store().await;
        store.insert(&record("T1", "A", "B")).await.unwrap();

        store
            .update("T1", &patch(TodoField::LastName, "C"))
            .await
            .unwrap();

        let updated = store.find_one("T1").await.unwrap().unwrap();
        assert_eq!(updated.first_name, "A");
        assert_eq!(updated.last_name, "C");
        assert_eq!(updated.email_id, "T1@example.com");
    }

    #[tokio::test]
    async fn update_missing_id_fails_without_writing() {
        let (store, collection) = open_store().await;
        store.insert(&record("T1", "A", "B")).await.unwrap();

        let err = store
            .update("ghost", &patch(TodoField::FirstName, "Z"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound { id: "ghost".into() });
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn update_with_unchanged_values_reports_not_modified() {
        let (store, _) = open_store().await;
        store.insert(&record("T1", "A", "B")).await.unwrap();

        let err = store
            .update("T1", &patch(TodoField::FirstName, "A"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotModified { id: "T1".into() });
        assert_eq!(store.find_one("T1").await.unwrap().unwrap().first_name, "A");
    }

    #[tokio::test]
    async fn update_with_empty_patch_reports_not_modified() {
        let (store, _) = open_store().await;
        store.insert(&record("T1", "A", "B")).await.unwrap();

        let err = store.update("T1", &TodoPatch::default()).await.unwrap_err();
        assert_eq!(err, StoreError::NotModified { id: "T1".into() });
    }

    // --- Delete ---

    #[tokio::test]
    async fn delete_then_find_is_none_and_id_is_reusable() {
        let (store, _) = open_store().await;
        store.insert(&record("T1", "A", "B")).await.unwrap();

        store.delete("T1").await.unwrap();
        assert_eq!(store.find_one("T1").await.unwrap(), None);

        store.insert(&record("T1", "New", "Life")).await.unwrap();
        assert_eq!(
            store.find_one("T1").await.unwrap().unwrap().first_name,
            "New"
        );
    }

    #[tokio::test]
    async fn delete_missing_id_reports_not_found() {
        let (store, _) = open_store().await;
        let err = store.delete("ghost").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound { id: "ghost".into() });
    }

    // --- Engine failures ---

    /// Memory collection whose existence check gives a fixed answer, so the
    /// write that follows sees the state a concurrent request left behind.
    struct RacingCollection {
        inner: MemoryCollection,
        reports_existing: bool,
    }

    impl RacingCollection {
        fn new(reports_existing: bool) -> Self {
            Self {
                inner: MemoryCollection::new(),
                reports_existing,
            }
        }
    }

    #[async_trait]
    impl DocumentCollection for RacingCollection {
        fn engine(&self) -> &'static str {
            "racing"
        }
        async fn insert_one(&self, document: Document) -> Result<(), CollectionError> {
            self.inner.insert_one(document).await
        }
        async fn find(&self, filter: Option<&Filter>) -> Result<DocumentStream, CollectionError> {
            self.inner.find(filter).await
        }
        async fn find_one(&self, _filter: &Filter) -> Result<Option<Document>, CollectionError> {
            Ok(self.reports_existing.then(Document::new))
        }
        async fn update_one(
            &self,
            filter: &Filter,
            update: &UpdateSpec,
        ) -> Result<UpdateOutcome, CollectionError> {
            self.inner.update_one(filter, update).await
        }
        async fn delete_one(&self, filter: &Filter) -> Result<u64, CollectionError> {
            self.inner.delete_one(filter).await
        }
        async fn ensure_unique_index(&self, field: &str) -> Result<(), CollectionError> {
            self.inner.ensure_unique_index(field).await
        }
    }

    #[tokio::test]
    async fn engine_duplicate_maps_to_already_exists() {
        let collection = Arc::new(RacingCollection::new(false));
        let store = RecordStore::open(collection.clone(), &StoreConfig::default())
            .await
            .unwrap();
        store.insert(&record("T1", "A", "B")).await.unwrap();

        let err = store.insert(&record("T1", "C", "D")).await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists { id: "T1".into() });
        assert_eq!(collection.inner.len(), 1);
    }

    #[tokio::test]
    async fn update_racing_a_delete_reports_not_found() {
        let store = RecordStore::open(
            Arc::new(RacingCollection::new(true)),
            &StoreConfig::default(),
        )
        .await
        .unwrap();

        let err = store
            .update("gone", &patch(TodoField::FirstName, "Z"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound { id: "gone".into() });
    }

    fn stalled_store() -> RecordStore {
        let config = StoreConfig {
            operation_timeout: Duration::from_millis(20),
            ..StoreConfig::default()
        };
        RecordStore::new(Arc::new(StalledCollection), &config)
    }

    #[tokio::test]
    async fn stalled_engine_surfaces_unavailable() {
        let store = stalled_store();

        assert!(matches!(
            store.insert(&record("T1", "A", "B")).await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.find_one("T1").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.update("T1", &patch(TodoField::Location, "Y")).await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.delete("T1").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(matches!(
            store.find_all().await.err(),
            Some(StoreError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn stalled_engine_fails_open_with_unique_index() {
        let config = StoreConfig {
            operation_timeout: Duration::from_millis(20),
            ..StoreConfig::default()
        };
        let err = RecordStore::open(Arc::new(StalledCollection), &config)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("ensure_unique_index timed out"));
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_id_admit_exactly_one() {
        let (store, collection) = open_store().await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(&record("T1", &format!("F{i}"), "L")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(err) => assert_eq!(err, StoreError::AlreadyExists { id: "T1".into() }),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(collection.len(), 1);
    }
}
