//! Todo Core — typed todo records and the document codec.
//!
//! The [`codec`] turns ordered `(field, value)` lists into the three shapes a
//! document collection understands: full documents, single-field equality
//! filters, and `$set`-style merge updates. The [`record`] module holds the
//! typed domain record that sits on the other side of that boundary.

pub mod codec;
pub mod document;
pub mod record;

pub use codec::{encode_document, encode_filter, encode_update, ID_FIELD};
pub use document::{Document, Filter, UpdateSpec};
pub use record::{RecordError, TodoField, TodoPatch, TodoRecord};
