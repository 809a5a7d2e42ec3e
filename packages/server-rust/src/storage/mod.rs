//! Storage layer for todo records.
//!
//! Two layers, wired together at startup:
//!
//! - **Collection** ([`DocumentCollection`]): a single logical collection in
//!   a document database, implemented by the in-memory engine and, behind the
//!   `mongodb` feature, by MongoDB
//! - **Record store** ([`RecordStore`]): CRUD semantics over one collection,
//!   shared by every request handler
//!
//! [`open_collection`] picks the engine named by [`StoreConfig`].

pub mod collection;
pub mod config;
pub mod engines;
pub mod error;
pub mod factory;
pub mod record_store;

pub use collection::*;
pub use config::{StoreBackend, StoreConfig};
pub use engines::{MemoryCollection, MemoryDatabase};
#[cfg(feature = "mongodb")]
pub use engines::MongoCollection;
pub use error::StoreError;
pub use factory::open_collection;
pub use record_store::{RecordStore, RecordStream};
