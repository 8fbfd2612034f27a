// src/models/row.rs

//! Row types for one sync invocation.
//!
//! A [`Row`] is the raw spreadsheet row as delivered in the invocation
//! payload. Mapping it against the field rule table produces a [`MappedRow`]:
//! either a [`ValidRow`] carrying the profile document fields, or an invalid
//! marker that only remembers what to report in `failedRows`.

use mongodb::bson::Document;

use crate::mapping::fields;

/// One raw spreadsheet row, keyed by external column names.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result of validating a raw row at the mapping boundary.
#[derive(Debug, Clone)]
pub enum MappedRow {
    /// Row mapped cleanly and carries a usable application number.
    Valid(ValidRow),

    /// Row has no usable application number after mapping. `source_key` is
    /// the raw "Application Number" cell rendered as a string (empty when
    /// the column was absent), which is what lands in the failure report.
    Invalid { source_key: String },
}

/// A mapped row with a verified primary key.
#[derive(Debug, Clone)]
pub struct ValidRow {
    /// The non-empty `applicationNumber` value
    pub application_number: String,

    /// All mapped fields, including the primary key
    pub fields: Document,
}

impl ValidRow {
    /// The mapped college email, if present and non-empty.
    pub fn email(&self) -> Option<&str> {
        self.fields
            .get_str(fields::COLLEGE_EMAIL)
            .ok()
            .filter(|value| !value.is_empty())
    }

    /// The mapped active status, defaulting to `true` when absent.
    pub fn is_active(&self) -> bool {
        self.fields.get_bool(fields::IS_ACTIVE).unwrap_or(true)
    }

    /// The field set for a profile update: everything except the key.
    ///
    /// Profile updates never rewrite the key they are filtered by.
    pub fn update_fields(&self) -> Document {
        let mut update = self.fields.clone();
        update.remove(fields::APPLICATION_NUMBER);
        update
    }
}
