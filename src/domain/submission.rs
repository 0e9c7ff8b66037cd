//! Submission model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One filled-in instance of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Unique instance identifier (e.g. `uuid:...`)
    pub instance_id: String,

    /// When the submission was received by the server
    pub submitted_at: DateTime<Utc>,

    /// Answers keyed by field name
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl Submission {
    /// Create a new submission without answers
    pub fn new(instance_id: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            instance_id: instance_id.into(),
            submitted_at,
            values: Map::new(),
        }
    }

    /// Set an answer
    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Date the submission was received, used for date-window filtering
    pub fn submission_date(&self) -> NaiveDate {
        self.submitted_at.date_naive()
    }

    /// File-system safe name derived from the instance id
    pub fn file_stem(&self) -> String {
        self.instance_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_submission_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 0).unwrap();
        let sub = Submission::new("uuid:1", at);
        assert_eq!(sub.submission_date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_file_stem_is_sanitized() {
        let sub = Submission::new("uuid:ab/c", Utc::now());
        assert_eq!(sub.file_stem(), "uuid_ab_c");
    }
}
