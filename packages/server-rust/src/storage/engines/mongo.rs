//! MongoDB-backed [`DocumentCollection`] engine (cargo feature `mongodb`).
//!
//! Translates codec shapes to BSON at this boundary only. Non-string fields
//! in stored documents (the server-assigned `_id`, for one) are skipped on
//! read because todo records only carry strings.

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use mongodb::bson::{self, Bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use todo_core::{Document, Filter, UpdateSpec};

use crate::storage::collection::{
    CollectionError, DocumentCollection, DocumentStream, UpdateOutcome,
};

/// MongoDB server error code for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// A collection in a MongoDB deployment.
#[derive(Debug, Clone)]
pub struct MongoCollection {
    inner: Collection<bson::Document>,
}

impl MongoCollection {
    /// Connects to `uri` and selects `database.collection`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unavailable`] if the URI cannot be parsed or
    /// the client cannot be created.
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
    ) -> Result<Self, CollectionError> {
        let client = Client::with_uri_str(uri).await.map_err(unavailable)?;
        Ok(Self {
            inner: client.database(database).collection(collection),
        })
    }
}

fn unavailable(err: mongodb::error::Error) -> CollectionError {
    CollectionError::Unavailable(err.to_string())
}

fn to_bson(document: &Document) -> bson::Document {
    let mut out = bson::Document::new();
    for (name, value) in document.iter() {
        out.insert(name, value);
    }
    out
}

fn filter_to_bson(filter: &Filter) -> bson::Document {
    let mut out = bson::Document::new();
    out.insert(filter.field.as_str(), filter.value.as_str());
    out
}

fn update_to_bson(update: &UpdateSpec) -> bson::Document {
    let mut out = bson::Document::new();
    out.insert("$set", to_bson(update.assignments()));
    out
}

fn from_bson(document: &bson::Document) -> Document {
    document
        .iter()
        .filter_map(|(name, value)| match value {
            Bson::String(s) => Some((name.as_str(), s.as_str())),
            _ => None,
        })
        .collect()
}

/// Server error code for write failures and failed commands.
///
/// Duplicate inserts surface as write errors; an index build over duplicate
/// data surfaces as a command error.
fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

/// Pulls the string value out of a `dup key: { field: "value" }` message.
fn dup_key_value(message: &str, field: &str) -> Option<String> {
    let marker = format!("dup key: {{ {field}: \"");
    let start = message.find(&marker)? + marker.len();
    let len = message[start..].find('"')?;
    Some(message[start..start + len].to_owned())
}

/// `DuplicateKey` when `code` is 11000, `Unavailable` otherwise.
fn classify(code: Option<i32>, field: &str, value: Option<&str>, message: String) -> CollectionError {
    if code != Some(DUPLICATE_KEY_CODE) {
        return CollectionError::Unavailable(message);
    }
    let value = value
        .map(str::to_owned)
        .or_else(|| dup_key_value(&message, field))
        .unwrap_or_default();
    CollectionError::DuplicateKey {
        field: field.to_owned(),
        value,
    }
}

fn classify_write(err: &mongodb::error::Error, field: &str, document: &Document) -> CollectionError {
    classify(server_code(err), field, document.get(field), err.to_string())
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn engine(&self) -> &'static str {
        "mongodb"
    }

    async fn insert_one(&self, document: Document) -> Result<(), CollectionError> {
        self.inner
            .insert_one(to_bson(&document))
            .await
            .map(|_| ())
            .map_err(|err| classify_write(&err, todo_core::ID_FIELD, &document))
    }

    async fn find(&self, filter: Option<&Filter>) -> Result<DocumentStream, CollectionError> {
        let query = filter.map(filter_to_bson).unwrap_or_default();
        let cursor = self.inner.find(query).await.map_err(unavailable)?;
        Ok(cursor
            .map_ok(|doc| from_bson(&doc))
            .map_err(unavailable)
            .boxed())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CollectionError> {
        let found = self
            .inner
            .find_one(filter_to_bson(filter))
            .await
            .map_err(unavailable)?;
        Ok(found.as_ref().map(from_bson))
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> Result<UpdateOutcome, CollectionError> {
        let result = self
            .inner
            .update_one(filter_to_bson(filter), update_to_bson(update))
            .await
            .map_err(|err| classify_write(&err, todo_core::ID_FIELD, update.assignments()))?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, CollectionError> {
        let result = self
            .inner
            .delete_one(filter_to_bson(filter))
            .await
            .map_err(unavailable)?;
        Ok(result.deleted_count)
    }

    async fn ensure_unique_index(&self, field: &str) -> Result<(), CollectionError> {
        let mut keys = bson::Document::new();
        keys.insert(field, 1_i32);
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.inner
            .create_index(index)
            .await
            .map(|_| ())
            .map_err(|err| classify(server_code(&err), field, None, err.to_string()))
    }
}
