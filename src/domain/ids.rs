//! Domain identifier types with validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between a form id and a preference key in per-form override keys
pub const KEY_PREFIX_SEPARATOR: &str = "::";

/// Form identifier newtype wrapper
///
/// A form id is the stable key for the registry, for per-form configuration
/// overrides (`"<form_id>::<key>"`) and for output file names.
///
/// # Examples
///
/// ```
/// use satchel::domain::ids::FormId;
/// use std::str::FromStr;
///
/// let form_id = FormId::from_str("household_survey").unwrap();
/// assert_eq!(form_id.as_str(), "household_survey");
/// assert!(FormId::new("bad::id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormId(String);

impl FormId {
    /// Creates a new FormId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Form ID cannot be empty".to_string());
        }
        if id.contains(KEY_PREFIX_SEPARATOR) {
            return Err(format!(
                "Form ID '{id}' cannot contain '{KEY_PREFIX_SEPARATOR}'"
            ));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(format!("Form ID '{id}' cannot contain path separators"));
        }
        if id == "." || id == ".." {
            return Err(format!("Form ID '{id}' is a reserved path name"));
        }
        if id.chars().any(char::is_control) {
            return Err(format!("Form ID {id:?} cannot contain control characters"));
        }
        Ok(Self(id))
    }

    /// Returns the form ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Prefix under which this form's configuration override is stored
    pub fn custom_conf_prefix(&self) -> String {
        format!("{}{}", self.0, KEY_PREFIX_SEPARATOR)
    }

    /// Preference key recording this form's last successful export
    pub fn last_export_key(&self) -> String {
        format!("{}_last_export_date", self.0)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FormId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FormId> for String {
    fn from(id: FormId) -> Self {
        id.0
    }
}

impl AsRef<str> for FormId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_form_id_valid() {
        let id = FormId::new("household_survey").unwrap();
        assert_eq!(id.as_str(), "household_survey");
        assert_eq!(id.to_string(), "household_survey");
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "whitespace")]
    #[test_case("a::b" ; "prefix separator")]
    #[test_case("../etc" ; "path separator")]
    #[test_case("." ; "current directory")]
    #[test_case(".." ; "parent directory")]
    #[test_case("form\n1" ; "newline")]
    #[test_case("form\u{0}" ; "nul")]
    fn test_form_id_invalid(raw: &str) {
        assert!(FormId::new(raw).is_err());
    }

    #[test]
    fn test_form_id_dots_inside_name() {
        assert!(FormId::new("survey.v2").is_ok());
        assert!(FormId::new("...").is_ok());
    }

    #[test]
    fn test_custom_conf_prefix() {
        let id = FormId::new("visits").unwrap();
        assert_eq!(id.custom_conf_prefix(), "visits::");
        assert_eq!(id.last_export_key(), "visits_last_export_date");
    }

    #[test]
    fn test_form_id_serde() {
        let id = FormId::new("visits").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"visits\"");
        let back: FormId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<FormId>("\"a::b\"").is_err());
    }
}
