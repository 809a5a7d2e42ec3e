//! Command-line arguments for the `todo-server` binary.
//!
//! Every flag can also come from the environment. [`Cli`] is the only place
//! that reads it; the rest of the crate receives explicit config structs.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::network::NetworkConfig;
use crate::storage::{StoreBackend, StoreConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Todo record service over HTTP
#[derive(Parser, Debug)]
#[command(name = "todo-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "TODO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on (0 picks a free port)
    #[arg(long, env = "TODO_PORT", default_value_t = 8080)]
    pub port: u16,

    /// MongoDB connection string; the in-memory store is used when absent
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// Database holding the todo collection
    #[arg(long, env = "TODO_DATABASE", default_value = "TodoRecords")]
    pub database: String,

    /// Collection holding todo records
    #[arg(long, env = "TODO_COLLECTION", default_value = "TodoCollection")]
    pub collection: String,

    /// Upper bound on each storage call, in milliseconds
    #[arg(long, env = "TODO_OPERATION_TIMEOUT_MS", default_value_t = 5_000)]
    pub operation_timeout_ms: u64,

    /// Upper bound on each HTTP request, in seconds
    #[arg(long, env = "TODO_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins, comma separated
    #[arg(
        long,
        env = "TODO_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    pub cors_origins: Vec<String>,

    /// Log output format
    #[arg(long, env = "TODO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Skip creating the unique index on `Id`
    #[arg(long)]
    pub no_unique_index: bool,
}

impl Cli {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }

    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        let backend = match &self.mongodb_uri {
            Some(uri) => StoreBackend::MongoDb { uri: uri.clone() },
            None => StoreBackend::Memory,
        };
        StoreConfig {
            backend,
            database: self.database.clone(),
            collection: self.collection.clone(),
            operation_timeout: Duration::from_millis(self.operation_timeout_ms),
            enforce_unique_id: !self.no_unique_index,
        }
    }
}
