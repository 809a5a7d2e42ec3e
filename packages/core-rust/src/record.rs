//! Typed todo records.
//!
//! [`TodoRecord`] and [`TodoPatch`] carry the closed field set named by
//! [`TodoField`]. Conversion to and from the loose [`Document`] shape happens
//! only here, so a misspelled field name cannot reach the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::ID_FIELD;
use crate::document::Document;

/// Errors raised while decoding a stored document into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("document is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Recognized todo fields, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TodoField {
    Id,
    FirstName,
    LastName,
    EmailId,
    Location,
}

impl TodoField {
    /// Every field, identifier first.
    pub const ALL: [TodoField; 5] = [
        TodoField::Id,
        TodoField::FirstName,
        TodoField::LastName,
        TodoField::EmailId,
        TodoField::Location,
    ];

    /// Fields an update may assign.
    pub const UPDATABLE: [TodoField; 4] = [
        TodoField::FirstName,
        TodoField::LastName,
        TodoField::EmailId,
        TodoField::Location,
    ];

    /// Document field name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TodoField::Id => ID_FIELD,
            TodoField::FirstName => "firstName",
            TodoField::LastName => "lastName",
            TodoField::EmailId => "emailId",
            TodoField::Location => "location",
        }
    }

    /// Parses an exact (case-sensitive) document field name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for TodoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "emailId")]
    pub email_id: String,
    pub location: String,
}

impl TodoRecord {
    /// Value of a single field.
    #[must_use]
    pub fn field(&self, field: TodoField) -> &str {
        match field {
            TodoField::Id => &self.id,
            TodoField::FirstName => &self.first_name,
            TodoField::LastName => &self.last_name,
            TodoField::EmailId => &self.email_id,
            TodoField::Location => &self.location,
        }
    }

    /// All fields as `(name, value)` pairs in canonical order.
    #[must_use]
    pub fn to_fields(&self) -> Vec<(&'static str, &str)> {
        TodoField::ALL
            .into_iter()
            .map(|field| (field.as_str(), self.field(field)))
            .collect()
    }

    /// Decodes a stored document. Fields outside [`TodoField`] are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingField`] if any recognized field is absent.
    pub fn from_document(document: &Document) -> Result<Self, RecordError> {
        let take = |field: TodoField| {
            document
                .get(field.as_str())
                .map(str::to_owned)
                .ok_or(RecordError::MissingField(field.as_str()))
        };
        Ok(Self {
            id: take(TodoField::Id)?,
            first_name: take(TodoField::FirstName)?,
            last_name: take(TodoField::LastName)?,
            email_id: take(TodoField::EmailId)?,
            location: take(TodoField::Location)?,
        })
    }
}

/// A partial update: only the fields that are `Some` get assigned.
///
/// The identifier is not part of a patch; it selects the record instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_id: Option<String>,
    pub location: Option<String>,
}

impl TodoPatch {
    /// Sets one field. Assigning [`TodoField::Id`] is ignored.
    pub fn set(&mut self, field: TodoField, value: impl Into<String>) {
        let slot = match field {
            TodoField::Id => return,
            TodoField::FirstName => &mut self.first_name,
            TodoField::LastName => &mut self.last_name,
            TodoField::EmailId => &mut self.email_id,
            TodoField::Location => &mut self.location,
        };
        *slot = Some(value.into());
    }

    fn slot(&self, field: TodoField) -> Option<&str> {
        match field {
            TodoField::Id => None,
            TodoField::FirstName => self.first_name.as_deref(),
            TodoField::LastName => self.last_name.as_deref(),
            TodoField::EmailId => self.email_id.as_deref(),
            TodoField::Location => self.location.as_deref(),
        }
    }

    /// Assigned fields as `(name, value)` pairs in canonical order.
    #[must_use]
    pub fn to_fields(&self) -> Vec<(&'static str, &str)> {
        TodoField::UPDATABLE
            .into_iter()
            .filter_map(|field| self.slot(field).map(|value| (field.as_str(), value)))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_document;

    fn sample() -> TodoRecord {
        TodoRecord {
            id: "T1".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            email_id: "a@b.com".into(),
            location: "X".into(),
        }
    }

    #[test]
    fn field_names_round_trip_through_parse() {
        for field in TodoField::ALL {
            assert_eq!(TodoField::parse(field.as_str()), Some(field));
        }
        assert_eq!(TodoField::parse("firstname"), None);
        assert_eq!(TodoField::parse("_id"), None);
    }

    #[test]
    fn to_fields_uses_canonical_order() {
        let names: Vec<_> = sample().to_fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Id", "firstName", "lastName", "emailId", "location"]);
    }

    #[test]
    fn from_document_ignores_unknown_fields() {
        let mut doc = encode_document(sample().to_fields());
        doc.push("_id", "65a1f0");
        assert_eq!(TodoRecord::from_document(&doc).unwrap(), sample());
    }

    #[test]
    fn from_document_reports_missing_field() {
        let doc = encode_document([("Id", "T1"), ("firstName", "A")]);
        let err = TodoRecord::from_document(&doc).unwrap_err();
        assert_eq!(err, RecordError::MissingField("lastName"));
    }

    #[test]
    fn serializes_with_document_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["Id"], "T1");
        assert_eq!(json["emailId"], "a@b.com");
        assert!(json.get("email_id").is_none());
    }

    #[test]
    fn patch_lists_only_assigned_fields() {
        let mut patch = TodoPatch::default();
        assert!(patch.is_empty());

        patch.set(TodoField::Location, "Y");
        patch.set(TodoField::FirstName, "Z");
        patch.set(TodoField::Id, "ignored");

        assert_eq!(patch.to_fields(), vec![("firstName", "Z"), ("location", "Y")]);
    }
}
