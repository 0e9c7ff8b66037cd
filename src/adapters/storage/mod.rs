//! Local form storage
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/forms/<form_id>/form.json
//! <root>/forms/<form_id>/submissions/<instance_id>.json
//! ```

pub mod writer;

pub use writer::{ExportWriter, JsonLinesWriter};

use crate::core::cache::DEFINITION_FILE_NAME;
use crate::domain::ids::FormId;
use crate::domain::{Result, SatchelError, Submission, TransferError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

const FORMS_DIR: &str = "forms";
const SUBMISSIONS_DIR: &str = "submissions";

/// Local storage of form definitions and submissions
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Path of the definition file for a form
    fn definition_path(&self, form_id: &FormId) -> PathBuf;

    /// Every stored submission of a form, oldest first
    async fn load_submissions(&self, form_id: &FormId) -> Result<Vec<Submission>>;

    /// Store submissions, replacing ones with the same instance id
    ///
    /// Returns the number of submissions written.
    async fn save_submissions(&self, form_id: &FormId, submissions: &[Submission]) -> Result<usize>;

    /// Write a definition document, returning its path
    async fn install_definition(&self, form_id: &FormId, document: &[u8]) -> Result<PathBuf>;
}

/// File-system backed [`SubmissionStore`]
#[derive(Debug, Clone)]
pub struct FileSubmissionStore {
    root: PathBuf,
}

impl FileSubmissionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn form_dir(&self, form_id: &FormId) -> PathBuf {
        self.root.join(FORMS_DIR).join(form_id.as_str())
    }

    fn submissions_dir(&self, form_id: &FormId) -> PathBuf {
        self.form_dir(form_id).join(SUBMISSIONS_DIR)
    }
}

#[async_trait]
impl SubmissionStore for FileSubmissionStore {
    fn definition_path(&self, form_id: &FormId) -> PathBuf {
        self.form_dir(form_id).join(DEFINITION_FILE_NAME)
    }

    async fn load_submissions(&self, form_id: &FormId) -> Result<Vec<Submission>> {
        let dir = self.submissions_dir(form_id);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&dir).await.map_err(|e| read_failed(&dir, e))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| read_failed(&dir, e))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut submissions = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).await.map_err(|e| read_failed(&path, e))?;
            let submission: Submission = serde_json::from_slice(&bytes).map_err(|e| {
                SatchelError::Transfer(TransferError::ReadFailed(format!(
                    "{}: {e}",
                    path.display()
                )))
            })?;
            submissions.push(submission);
        }

        submissions.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.instance_id.cmp(&b.instance_id))
        });
        Ok(submissions)
    }

    async fn save_submissions(&self, form_id: &FormId, submissions: &[Submission]) -> Result<usize> {
        let dir = self.submissions_dir(form_id);
        fs::create_dir_all(&dir).await.map_err(|e| write_failed(&dir, e))?;

        for submission in submissions {
            let path = dir.join(format!("{}.json", submission.file_stem()));
            let bytes = serde_json::to_vec_pretty(submission)?;
            fs::write(&path, bytes).await.map_err(|e| write_failed(&path, e))?;
        }

        tracing::debug!(form_id = %form_id, count = submissions.len(), "Saved submissions");
        Ok(submissions.len())
    }

    async fn install_definition(&self, form_id: &FormId, document: &[u8]) -> Result<PathBuf> {
        let dir = self.form_dir(form_id);
        fs::create_dir_all(&dir).await.map_err(|e| write_failed(&dir, e))?;

        let path = self.definition_path(form_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, document).await.map_err(|e| write_failed(&tmp, e))?;
        fs::rename(&tmp, &path).await.map_err(|e| write_failed(&path, e))?;
        Ok(path)
    }
}

fn read_failed(path: &Path, e: std::io::Error) -> SatchelError {
    SatchelError::Transfer(TransferError::ReadFailed(format!("{}: {e}", path.display())))
}

fn write_failed(path: &Path, e: std::io::Error) -> SatchelError {
    SatchelError::Transfer(TransferError::WriteFailed(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn form_id() -> FormId {
        FormId::new("household").unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_form_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSubmissionStore::new(dir.path());
        assert!(store.load_submissions(&form_id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_sorted_by_date() {
        let dir = TempDir::new().unwrap();
        let store = FileSubmissionStore::new(dir.path());
        let later = Submission::new("uuid:b", Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
            .with_value("name", json!("B"));
        let earlier = Submission::new("uuid:a", Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let saved = store
            .save_submissions(&form_id(), &[later.clone(), earlier.clone()])
            .await
            .unwrap();
        assert_eq!(saved, 2);

        let loaded = store.load_submissions(&form_id()).await.unwrap();
        assert_eq!(loaded, vec![earlier, later]);
        assert!(dir
            .path()
            .join("forms/household/submissions/uuid_a.json")
            .exists());
    }

    #[tokio::test]
    async fn test_corrupt_submission_is_read_failure() {
        let dir = TempDir::new().unwrap();
        let store = FileSubmissionStore::new(dir.path());
        let subs = dir.path().join("forms/household/submissions");
        std::fs::create_dir_all(&subs).unwrap();
        std::fs::write(subs.join("bad.json"), b"{ not json").unwrap();

        let err = store.load_submissions(&form_id()).await.unwrap_err();
        assert!(matches!(
            err,
            SatchelError::Transfer(TransferError::ReadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_install_definition() {
        let dir = TempDir::new().unwrap();
        let store = FileSubmissionStore::new(dir.path());
        let path = store
            .install_definition(&form_id(), br#"{"id": "household"}"#)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("forms/household/form.json"));
        assert_eq!(path, store.definition_path(&form_id()));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
