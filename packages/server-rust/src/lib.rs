//! Todo Server — HTTP CRUD service over a document collection of todo records.

pub mod cli;
pub mod logging;
pub mod network;
pub mod storage;

pub use network::NetworkModule;
pub use storage::{open_collection, RecordStore, StoreError};
