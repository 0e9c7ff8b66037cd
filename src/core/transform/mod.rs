//! Submission transformation
//!
//! Converts a [`Submission`] into one flat export row following the field
//! order of its [`FormDefinition`]. Two column layouts are supported:
//!
//! - **Compact**: every field maps to one column holding the raw answer
//! - **Exploded**: `select_multiple` fields become one boolean column per choice

pub mod flatten;

use crate::domain::form::{FieldKind, FormDefinition};
use crate::domain::submission::Submission;
use crate::domain::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

pub use crate::domain::form::{INSTANCE_ID_COLUMN, SUBMISSION_DATE_COLUMN};

/// Column layout for `select_multiple` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChoiceLayout {
    /// Keep the answer as submitted
    #[default]
    Compact,
    /// One boolean column per choice, named `field/choice`
    Exploded,
}

impl ChoiceLayout {
    pub fn from_flag(explode_choice_lists: bool) -> Self {
        if explode_choice_lists {
            Self::Exploded
        } else {
            Self::Compact
        }
    }
}

/// One export row with columns in a stable order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRow {
    columns: Vec<(String, Value)>,
}

impl ExportRow {
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for ExportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Transform a submission into an export row
///
/// Answers for fields unknown to the definition are dropped; fields without an
/// answer produce `null`.
///
/// # Errors
///
/// Returns `SatchelError::Parse` when a `select_multiple` answer cannot be
/// read as a choice list in the exploded layout.
///
/// # Examples
///
/// ```
/// use satchel::core::transform::{transform_submission, ChoiceLayout};
/// use satchel::domain::{FormDefinition, Submission};
/// use chrono::Utc;
/// use serde_json::json;
/// use std::path::Path;
///
/// # fn example() -> satchel::domain::Result<()> {
/// let definition = FormDefinition::from_json(
///     Path::new("form.json"),
///     br#"{"id": "survey", "fields": [
///         {"name": "assets", "type": "select_multiple", "choices": ["radio", "bicycle"]}
///     ]}"#,
/// )?;
/// let submission = Submission::new("uuid:1", Utc::now()).with_value("assets", json!("radio"));
///
/// let row = transform_submission(&definition, &submission, ChoiceLayout::Exploded)?;
/// assert_eq!(row.get("assets/radio"), Some(&json!(true)));
/// assert_eq!(row.get("assets/bicycle"), Some(&json!(false)));
/// # Ok(())
/// # }
/// ```
pub fn transform_submission(
    definition: &FormDefinition,
    submission: &Submission,
    layout: ChoiceLayout,
) -> Result<ExportRow> {
    let mut row = ExportRow::default();
    row.push(INSTANCE_ID_COLUMN, Value::String(submission.instance_id.clone()));
    row.push(
        SUBMISSION_DATE_COLUMN,
        Value::String(submission.submission_date().format("%Y-%m-%d").to_string()),
    );

    for field in &definition.fields {
        let answer = submission.values.get(&field.name);
        match (field.kind, layout) {
            (FieldKind::SelectMultiple, ChoiceLayout::Exploded) => {
                flatten::explode_choices(&mut row, field, answer)?;
            }
            _ => row.push(field.name.clone(), answer.cloned().unwrap_or(Value::Null)),
        }
    }

    Ok(row)
}
