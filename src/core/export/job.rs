//! One form's export job
//!
//! Steps run strictly in order, each preceded by a cancellation checkpoint:
//! resolve definition, optional pull, load and filter submissions, transform
//! each submission, write output. Output is written only after every row is
//! transformed, so a cancelled job leaves no partial file.

use super::cancellation::CancellationToken;
use super::registry::{FormRegistry, SelectedForm};
use super::status::StatusSink;
use crate::adapters::remote::RemoteSource;
use crate::adapters::storage::{ExportWriter, SubmissionStore};
use crate::core::cache::DefinitionCache;
use crate::core::transform::{transform_submission, ChoiceLayout};
use crate::domain::form::FormDefinition;
use crate::domain::ids::FormId;
use crate::domain::{Result, SatchelError};
use std::path::PathBuf;
use std::sync::Arc;

/// Collaborators shared by every job of a run
#[derive(Clone)]
pub(crate) struct JobContext {
    pub cache: Arc<DefinitionCache>,
    pub store: Arc<dyn SubmissionStore>,
    pub writer: Arc<dyn ExportWriter>,
    pub remote: Option<Arc<dyn RemoteSource>>,
    pub sink: Arc<dyn StatusSink>,
    pub registry: Arc<FormRegistry>,
}

impl JobContext {
    fn notify(&self, form_id: &FormId, message: &str, is_error: bool) {
        self.registry.notify(form_id, message, is_error);
        self.sink.notify(form_id, message, is_error);
    }
}

/// Result of a completed job
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JobSuccess {
    pub exported: usize,
    pub output: PathBuf,
}

pub(crate) struct ExportJob {
    form: SelectedForm,
    ctx: JobContext,
    token: CancellationToken,
}

impl ExportJob {
    pub fn new(form: SelectedForm, ctx: JobContext, token: CancellationToken) -> Self {
        Self { form, ctx, token }
    }

    /// Run the job, reporting failure through status notifications
    pub async fn run(self) -> Result<JobSuccess> {
        let form_id = self.form.definition.id.clone();
        let result = self.execute().await;
        match &result {
            Ok(success) => self.ctx.notify(
                &form_id,
                &format!(
                    "Exported {} submission(s) to {}",
                    success.exported,
                    success.output.display()
                ),
                false,
            ),
            Err(SatchelError::Cancelled) => self.ctx.notify(&form_id, "Export cancelled", false),
            Err(e) => self.ctx.notify(&form_id, &format!("Export failed: {e}"), true),
        }
        result
    }

    async fn execute(&self) -> Result<JobSuccess> {
        let config = &self.form.configuration;
        let form_id = &self.form.definition.id;

        self.token.checkpoint()?;
        self.ctx.registry.clear_status_history(form_id);
        self.ctx.notify(form_id, "Starting export", false);

        let definition = self.resolve_definition().await?;
        if definition.encrypted && config.pem_key_file.is_none() {
            return Err(SatchelError::Configuration(format!(
                "Form {form_id} is encrypted and needs a PEM key file"
            )));
        }
        let output_dir = config
            .output_directory
            .clone()
            .ok_or_else(|| SatchelError::Configuration("output directory is not set".to_string()))?;

        self.token.checkpoint()?;
        if config.pull_before() {
            self.pull(form_id).await?;
        }

        self.token.checkpoint()?;
        let submissions = self.ctx.store.load_submissions(form_id).await?;
        let total = submissions.len();
        let selected: Vec<_> = submissions
            .into_iter()
            .filter(|s| config.accepts_date(s.submission_date()))
            .collect();
        tracing::debug!(
            form_id = %form_id,
            total,
            in_window = selected.len(),
            "Loaded submissions"
        );

        let layout = ChoiceLayout::from_flag(config.explode_choice_lists());
        let mut rows = Vec::with_capacity(selected.len());
        for submission in &selected {
            self.token.checkpoint()?;
            rows.push(transform_submission(&definition, submission, layout)?);
        }

        self.token.checkpoint()?;
        let output = self
            .ctx
            .writer
            .write(form_id, &output_dir, &rows, config.overwrite_existing())
            .await?;

        Ok(JobSuccess {
            exported: rows.len(),
            output,
        })
    }

    /// Resolve the definition through the cache, off the async workers
    async fn resolve_definition(&self) -> Result<FormDefinition> {
        let cache = self.ctx.cache.clone();
        let path = self.form.definition.source_path.clone();
        tokio::task::spawn_blocking(move || cache.get(&path))
            .await
            .map_err(|e| SatchelError::Other(format!("Definition task failed: {e}")))?
    }

    async fn pull(&self, form_id: &FormId) -> Result<()> {
        let remote = self.ctx.remote.as_ref().ok_or_else(|| {
            SatchelError::Configuration(
                "pull before export requested but no remote server is configured".to_string(),
            )
        })?;

        self.ctx.notify(form_id, "Pulling submissions", false);
        let submissions = remote.fetch_submissions(form_id).await?;
        let saved = self.ctx.store.save_submissions(form_id, &submissions).await?;
        self.ctx
            .notify(form_id, &format!("Pulled {saved} submission(s)"), false);
        Ok(())
    }
}
