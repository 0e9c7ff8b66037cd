//! Export run report
//!
//! A run produces one [`FormResult`] per selected form, in snapshot order.
//! Successes are kept for diagnostics but are silent in the aggregate summary:
//! only failed and cancelled forms produce summary lines.

use crate::domain::errors::{ErrorKind, SatchelError};
use crate::domain::ids::FormId;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Terminal state of one form's job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Succeeded { exported: usize, output: PathBuf },
    Failed { kind: ErrorKind, message: String },
    Cancelled,
}

impl FormOutcome {
    /// Outcome for a job that stopped with `error`
    pub fn from_error(error: &SatchelError) -> Self {
        if error.is_cancelled() {
            FormOutcome::Cancelled
        } else {
            FormOutcome::Failed {
                kind: error.kind(),
                message: error.to_string(),
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FormOutcome::Succeeded { .. })
    }

    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            FormOutcome::Succeeded { .. } => "succeeded",
            FormOutcome::Failed { .. } => "failed",
            FormOutcome::Cancelled => "cancelled",
        }
    }
}

/// Outcome of one form within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResult {
    pub form_id: FormId,
    pub title: String,
    pub outcome: FormOutcome,
}

impl FormResult {
    /// One human-readable line for a non-success outcome
    pub fn summary_line(&self) -> Option<String> {
        match &self.outcome {
            FormOutcome::Succeeded { .. } => None,
            FormOutcome::Failed { kind, message } => {
                Some(format!("{} ({}): {kind}: {message}", self.title, self.form_id))
            }
            FormOutcome::Cancelled => Some(format!("{} ({}): Cancelled", self.title, self.form_id)),
        }
    }
}

/// Report of one export run
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub run_id: Uuid,
    pub results: Vec<FormResult>,
    pub duration: Duration,
}

impl ExportReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            results: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn push(&mut self, result: FormResult) {
        self.results.push(result);
    }

    /// Non-success outcomes, in snapshot order
    pub fn errors(&self) -> Vec<&FormResult> {
        self.results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .collect()
    }

    /// Whether every form succeeded
    pub fn is_successful(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| o.is_success())
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FormOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, FormOutcome::Cancelled))
    }

    /// Total submissions exported across successful forms
    pub fn exported_submissions(&self) -> usize {
        self.results
            .iter()
            .map(|r| match r.outcome {
                FormOutcome::Succeeded { exported, .. } => exported,
                _ => 0,
            })
            .sum()
    }

    pub fn get(&self, form_id: &FormId) -> Option<&FormResult> {
        self.results.iter().find(|r| &r.form_id == form_id)
    }

    /// Aggregate summary: one line per failed or cancelled form, empty on success
    pub fn summary_text(&self) -> String {
        self.results
            .iter()
            .filter_map(FormResult::summary_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn count(&self, predicate: impl Fn(&FormOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }

    /// Log the report
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            forms = self.results.len(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            cancelled = self.cancelled(),
            exported_submissions = self.exported_submissions(),
            duration_ms = self.duration.as_millis() as u64,
            "Export run completed"
        );

        for result in self.errors() {
            match &result.outcome {
                FormOutcome::Failed { kind, message } => tracing::warn!(
                    run_id = %self.run_id,
                    form_id = %result.form_id,
                    error_type = %kind,
                    message = %message,
                    "Form export failed"
                ),
                _ => tracing::info!(
                    run_id = %self.run_id,
                    form_id = %result.form_id,
                    "Form export cancelled"
                ),
            }
        }
    }
}
