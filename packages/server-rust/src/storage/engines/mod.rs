//! [`DocumentCollection`](super::DocumentCollection) engines.
//!
//! [`MemoryCollection`] is always available. [`MongoCollection`] is compiled
//! in with the `mongodb` cargo feature.

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;
#[cfg(test)]
mod stalled;

pub use memory::{MemoryCollection, MemoryDatabase};
#[cfg(feature = "mongodb")]
pub use mongo::MongoCollection;
#[cfg(test)]
pub(crate) use stalled::StalledCollection;
