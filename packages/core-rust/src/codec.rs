//! Translation from key/value field lists to storage document shapes.
//!
//! The codec is generic over the field set: it never inspects names except
//! to keep the identifier out of update specifications.

use crate::document::{Document, Filter, UpdateSpec};

/// Name of the identifier field. Never appears in an [`UpdateSpec`].
pub const ID_FIELD: &str = "Id";

/// Builds a document holding exactly `fields`, in order.
///
/// Duplicate names are kept as given; which one wins on lookup is the
/// caller's concern.
///
/// # Examples
///
/// ```
/// use todo_core::codec::encode_document;
///
/// let doc = encode_document([("Id", "T1"), ("firstName", "A")]);
/// assert_eq!(doc.get("firstName"), Some("A"));
/// assert_eq!(doc.len(), 2);
/// ```
pub fn encode_document<I, K, V>(fields: I) -> Document
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    fields
        .into_iter()
        .map(|(name, value)| (name.as_ref().to_owned(), value.as_ref().to_owned()))
        .collect()
}

/// Builds a single-field equality filter. Values are taken verbatim.
#[must_use]
pub fn encode_filter(field: &str, value: &str) -> Filter {
    Filter {
        field: field.to_owned(),
        value: value.to_owned(),
    }
}

/// Builds a merge update from `fields`, dropping any assignment to [`ID_FIELD`].
///
/// # Examples
///
/// ```
/// use todo_core::codec::encode_update;
///
/// let update = encode_update([("Id", "T9"), ("location", "X")]);
/// assert_eq!(update.assignments().get("Id"), None);
/// assert_eq!(update.assignments().get("location"), Some("X"));
/// ```
pub fn encode_update<I, K, V>(fields: I) -> UpdateSpec
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let set = fields
        .into_iter()
        .filter(|(name, _)| {
            let keep = name.as_ref() != ID_FIELD;
            if !keep {
                tracing::debug!("dropping identifier assignment from update");
            }
            keep
        })
        .map(|(name, value)| (name.as_ref().to_owned(), value.as_ref().to_owned()))
        .collect();
    UpdateSpec::new(set)
}
