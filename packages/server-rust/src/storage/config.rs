//! Record store configuration.

use std::time::Duration;

/// Which engine backs the todo collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local [`MemoryCollection`](super::MemoryCollection).
    Memory,
    /// A MongoDB deployment reachable at `uri`. Requires the `mongodb` feature.
    MongoDb { uri: String },
}

/// Configuration passed to [`open_collection`](super::open_collection) and
/// [`RecordStore::open`](super::RecordStore::open).
///
/// The connection string lives here and nowhere else once the store is built.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database name (ignored by the memory engine).
    pub database: String,
    /// Collection name.
    pub collection: String,
    /// Upper bound on every collection call, including each cursor step.
    pub operation_timeout: Duration,
    /// Ask the engine to enforce a unique index on `Id` at startup.
    pub enforce_unique_id: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database: "TodoRecords".to_string(),
            collection: "TodoCollection".to_string(),
            operation_timeout: Duration::from_secs(5),
            enforce_unique_id: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.database, "TodoRecords");
        assert_eq!(config.collection, "TodoCollection");
        assert_eq!(config.operation_timeout, Duration::from_secs(5));
        assert!(config.enforce_unique_id);
    }
}
