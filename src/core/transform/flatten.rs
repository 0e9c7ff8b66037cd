//! Choice-list flattening
//!
//! A `select_multiple` answer arrives either as a space-separated string
//! (`"radio phone"`) or as a JSON array of choice names. In the exploded
//! layout it is expanded into one boolean column per declared choice.

use super::ExportRow;
use crate::domain::form::FormField;
use crate::domain::{Result, SatchelError};
use serde_json::Value;
use std::collections::HashSet;

/// Column name for one choice of a multi-select field
///
/// - `("assets", "radio")` → `"assets/radio"`
pub fn choice_column(field: &str, choice: &str) -> String {
    format!("{field}/{choice}")
}

/// Push one boolean column per choice of `field`
///
/// A missing or `null` answer yields `null` in every column.
pub(crate) fn explode_choices(
    row: &mut ExportRow,
    field: &FormField,
    answer: Option<&Value>,
) -> Result<()> {
    let selected = match answer {
        None | Some(Value::Null) => None,
        Some(value) => Some(selected_choices(&field.name, value)?),
    };

    for choice in &field.choices {
        let cell = match &selected {
            Some(selected) => Value::Bool(selected.contains(choice.as_str())),
            None => Value::Null,
        };
        row.push(choice_column(&field.name, choice), cell);
    }

    if let Some(selected) = &selected {
        let unknown = selected
            .iter()
            .filter(|s| !field.choices.iter().any(|c| c == *s))
            .count();
        if unknown > 0 {
            tracing::debug!(field = %field.name, unknown, "Answer contains undeclared choices");
        }
    }

    Ok(())
}

fn selected_choices<'a>(field: &str, value: &'a Value) -> Result<HashSet<&'a str>> {
    match value {
        Value::String(s) => Ok(s.split_whitespace().collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    SatchelError::Parse(format!(
                        "Field '{field}' has a non-string choice: {item}"
                    ))
                })
            })
            .collect(),
        other => Err(SatchelError::Parse(format!(
            "Field '{field}' expects a choice list, got {other}"
        ))),
    }
}
