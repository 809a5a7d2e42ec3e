//! Factory for opening the configured [`DocumentCollection`].
//!
//! [`open_collection`] is the dependency injection point between
//! configuration and storage: it picks the engine named by
//! [`StoreBackend`] and returns it behind `Arc<dyn DocumentCollection>`.

use std::sync::Arc;

use tracing::info;

use crate::storage::collection::DocumentCollection;
use crate::storage::config::{StoreBackend, StoreConfig};
use crate::storage::engines::MemoryDatabase;

/// Opens the collection described by `config`.
///
/// The memory engine takes its collection from `memory`, so opening the same
/// collection name twice against one [`MemoryDatabase`] yields shared data.
/// Other engines ignore `memory`.
///
/// # Errors
///
/// Returns an error if the MongoDB client cannot be created, or if MongoDB
/// is requested from a build without the `mongodb` feature.
pub async fn open_collection(
    config: &StoreConfig,
    memory: &MemoryDatabase,
) -> anyhow::Result<Arc<dyn DocumentCollection>> {
    match &config.backend {
        StoreBackend::Memory => {
            info!(collection = %config.collection, "Using in-memory collection");
            Ok(memory.collection(&config.collection))
        }
        StoreBackend::MongoDb { uri } => open_mongo(uri, config).await,
    }
}

#[cfg(feature = "mongodb")]
async fn open_mongo(uri: &str, config: &StoreConfig) -> anyhow::Result<Arc<dyn DocumentCollection>> {
    use crate::storage::engines::MongoCollection;

    let collection = MongoCollection::connect(uri, &config.database, &config.collection).await?;
    info!(
        database = %config.database,
        collection = %config.collection,
        "Using MongoDB collection"
    );
    Ok(Arc::new(collection))
}

#[cfg(not(feature = "mongodb"))]
#[allow(clippy::unused_async)]
async fn open_mongo(
    _uri: &str,
    _config: &StoreConfig,
) -> anyhow::Result<Arc<dyn DocumentCollection>> {
    anyhow::bail!("a MongoDB URI was configured but this build lacks the `mongodb` feature")
}
