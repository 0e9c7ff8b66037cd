//! Export output writers

use crate::core::transform::ExportRow;
use crate::domain::ids::FormId;
use crate::domain::{Result, SatchelError, TransferError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Destination of transformed export rows
#[async_trait]
pub trait ExportWriter: Send + Sync {
    /// Write every row of one form's export, returning the output path
    ///
    /// With `overwrite` the previous output is replaced, otherwise rows are appended.
    async fn write(
        &self,
        form_id: &FormId,
        output_dir: &Path,
        rows: &[ExportRow],
        overwrite: bool,
    ) -> Result<PathBuf>;
}

/// Writes one JSON object per line to `<output_dir>/<form_id>.jsonl`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesWriter;

impl JsonLinesWriter {
    pub fn output_path(output_dir: &Path, form_id: &FormId) -> PathBuf {
        output_dir.join(format!("{form_id}.jsonl"))
    }
}

#[async_trait]
impl ExportWriter for JsonLinesWriter {
    async fn write(
        &self,
        form_id: &FormId,
        output_dir: &Path,
        rows: &[ExportRow],
        overwrite: bool,
    ) -> Result<PathBuf> {
        let mut buffer = Vec::new();
        for row in rows {
            serde_json::to_writer(&mut buffer, row)?;
            buffer.push(b'\n');
        }

        let path = Self::output_path(output_dir, form_id);
        let write_failed = |e: std::io::Error| {
            SatchelError::Transfer(TransferError::WriteFailed(format!("{}: {e}", path.display())))
        };

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(overwrite)
            .append(!overwrite)
            .open(&path)
            .await
            .map_err(write_failed)?;
        file.write_all(&buffer).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;

        tracing::debug!(
            form_id = %form_id,
            rows = rows.len(),
            path = %path.display(),
            "Wrote export file"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(id: &str) -> ExportRow {
        let mut row = ExportRow::default();
        row.push("instance_id", json!(id));
        row
    }

    #[tokio::test]
    async fn test_append_then_overwrite() {
        let dir = TempDir::new().unwrap();
        let form_id = FormId::new("visits").unwrap();
        let writer = JsonLinesWriter;

        writer.write(&form_id, dir.path(), &[row("a")], false).await.unwrap();
        let path = writer
            .write(&form_id, dir.path(), &[row("b")], false)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"instance_id\":\"a\"}\n{\"instance_id\":\"b\"}\n"
        );

        writer.write(&form_id, dir.path(), &[row("c")], true).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"instance_id\":\"c\"}\n"
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_write_failure() {
        let dir = TempDir::new().unwrap();
        let err = JsonLinesWriter
            .write(
                &FormId::new("visits").unwrap(),
                &dir.path().join("missing"),
                &[row("a")],
                true,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SatchelError::Transfer(TransferError::WriteFailed(_))
        ));
    }
}
