//! Storage-facing document shapes.
//!
//! [`Document`], [`Filter`], and [`UpdateSpec`] are the loose key/value trees
//! exchanged with a document collection. They are produced by the
//! [`codec`](crate::codec) and consumed by storage engines; domain code works
//! with the typed [`TodoRecord`](crate::TodoRecord) instead.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// An ordered list of `(field, value)` string pairs.
///
/// Field order is preserved exactly as built. Duplicate names are not
/// rejected; lookups resolve to the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<(String, String)>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field without checking for an existing field of the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Returns the value of `name`, resolving duplicates to the last occurrence.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrites every occurrence of `name`, or appends it when absent.
    ///
    /// Returns `true` if the stored value changed.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let mut found = false;
        let mut changed = false;
        for (field, current) in &mut self.fields {
            if field.as_str() == name {
                found = true;
                if current.as_str() != value {
                    value.clone_into(current);
                    changed = true;
                }
            }
        }
        if !found {
            self.push(name, value);
            changed = true;
        }
        changed
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of stored pairs, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Single-field equality predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Field the predicate inspects.
    pub field: String,
    /// Value the field must equal.
    pub value: String,
}

impl Filter {
    /// Returns `true` if `document` carries `field` with exactly `value`.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        document.get(&self.field) == Some(self.value.as_str())
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

/// A merge update: "set these fields, leave the rest alone".
///
/// Serializes as `{"$set": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSpec {
    set: Document,
}

impl UpdateSpec {
    pub(crate) fn new(set: Document) -> Self {
        Self { set }
    }

    /// The field assignments, in the order they were encoded.
    #[must_use]
    pub fn assignments(&self) -> &Document {
        &self.set
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Merges the assignments into `target`.
    ///
    /// Returns `true` if at least one field value actually changed.
    pub fn apply_to(&self, target: &mut Document) -> bool {
        let mut changed = false;
        for (name, value) in self.set.iter() {
            changed |= target.set(name, value);
        }
        changed
    }
}

impl Serialize for UpdateSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$set", &self.set)?;
        map.end()
    }
}
