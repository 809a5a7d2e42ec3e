//! `todo-server` entry point.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use todo_server::cli::Cli;
use todo_server::logging::init_tracing;
use todo_server::storage::MemoryDatabase;
use todo_server::{open_collection, NetworkModule, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let store_config = cli.store_config();
    let memory = MemoryDatabase::new();
    let collection = open_collection(&store_config, &memory).await?;
    let store = RecordStore::open(collection, &store_config).await?;
    info!(
        backend = store.engine(),
        database = %store_config.database,
        collection = %store_config.collection,
        "Record store ready"
    );

    let mut network = NetworkModule::new(cli.network_config(), Arc::new(store));
    let port = network.start().await?;
    info!(port, "todo-server listening");

    network
        .serve(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(%err, "Failed to listen for ctrl-c");
            }
        })
        .await
}
