//! Form definition model
//!
//! A form definition is the parsed structure of a data-collection template.
//! Definitions are stored on disk as JSON documents:
//!
//! ```json
//! {
//!   "id": "household_survey",
//!   "version": "2024031501",
//!   "title": "Household Survey",
//!   "fields": [
//!     { "name": "head_name", "type": "text" },
//!     { "name": "assets", "type": "select_multiple", "choices": ["radio", "bicycle"] }
//!   ]
//! }
//! ```

use crate::domain::errors::SatchelError;
use crate::domain::ids::FormId;
use crate::domain::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Export column holding the submission instance id
pub const INSTANCE_ID_COLUMN: &str = "instance_id";
/// Export column holding the submission date
pub const SUBMISSION_DATE_COLUMN: &str = "submission_date";

/// Field names taken by the metadata columns of every export row
pub const RESERVED_FIELD_NAMES: [&str; 2] = [INSTANCE_ID_COLUMN, SUBMISSION_DATE_COLUMN];

/// Field type of a form question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Date,
    Datetime,
    SelectOne,
    SelectMultiple,
    Geopoint,
    Binary,
}

impl FieldKind {
    /// Whether the field draws its values from a choice list
    pub fn has_choices(&self) -> bool {
        matches!(self, FieldKind::SelectOne | FieldKind::SelectMultiple)
    }
}

/// A single question of a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

/// Parsed form definition
///
/// Immutable once loaded. Identified by form id and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: FormId,

    #[serde(default)]
    pub version: Option<String>,

    pub title: String,

    /// File the definition was parsed from
    pub source_path: PathBuf,

    #[serde(default)]
    pub fields: Vec<FormField>,

    /// Submissions are encrypted and need a private key to export
    #[serde(default)]
    pub encrypted: bool,
}

/// On-disk shape of a definition document
#[derive(Debug, Deserialize)]
struct FormDocument {
    id: Option<String>,
    version: Option<String>,
    title: Option<String>,
    #[serde(default)]
    fields: Vec<FormField>,
    #[serde(default)]
    encrypted: bool,
}

impl FormDefinition {
    /// Parse a definition document
    ///
    /// # Errors
    ///
    /// Returns `SatchelError::Parse` if the bytes are not a well-formed definition.
    pub fn from_json(source_path: &Path, bytes: &[u8]) -> Result<Self> {
        let document: FormDocument = serde_json::from_slice(bytes).map_err(|e| {
            SatchelError::Parse(format!("{}: {e}", source_path.display()))
        })?;

        let raw_id = document.id.ok_or_else(|| {
            SatchelError::Parse(format!("{}: missing form id", source_path.display()))
        })?;
        let id = FormId::new(raw_id)
            .map_err(|e| SatchelError::Parse(format!("{}: {e}", source_path.display())))?;

        let mut seen = HashSet::new();
        for field in &document.fields {
            if field.name.trim().is_empty() {
                return Err(SatchelError::Parse(format!(
                    "{}: field with empty name",
                    source_path.display()
                )));
            }
            if RESERVED_FIELD_NAMES.contains(&field.name.as_str()) {
                return Err(SatchelError::Parse(format!(
                    "{}: field name '{}' is reserved",
                    source_path.display(),
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SatchelError::Parse(format!(
                    "{}: duplicate field '{}'",
                    source_path.display(),
                    field.name
                )));
            }
            if field.kind.has_choices() && field.choices.is_empty() {
                return Err(SatchelError::Parse(format!(
                    "{}: field '{}' has no choices",
                    source_path.display(),
                    field.name
                )));
            }
        }

        let title = document
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| id.as_str().to_string());

        Ok(Self {
            id,
            version: document.version.filter(|v| !v.trim().is_empty()),
            title,
            source_path: source_path.to_path_buf(),
            fields: document.fields,
            encrypted: document.encrypted,
        })
    }

    /// Serialize back into the on-disk document shape
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.as_str(),
            "version": self.version,
            "title": self.title,
            "fields": self.fields,
            "encrypted": self.encrypted,
        })
    }
}
