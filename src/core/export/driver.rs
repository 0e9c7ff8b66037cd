//! Export driver - runs one export job per selected form
//!
//! A run moves through `Idle -> Dispatched -> (per form: Running -> Succeeded |
//! Failed | Cancelled) -> Aggregated -> Idle`. The driver works on a snapshot
//! of the registry's selection taken at the start of the run, so selection or
//! configuration changes made while a run is in flight do not affect it.

use super::cancellation::CancellationToken;
use super::job::{ExportJob, JobContext};
use super::registry::FormRegistry;
use super::status::{StatusSink, TracingStatusSink};
use super::summary::{ExportReport, FormOutcome, FormResult};
use crate::adapters::remote::RemoteSource;
use crate::adapters::storage::{ExportWriter, SubmissionStore};
use crate::core::cache::DefinitionCache;
use crate::domain::errors::ErrorKind;
use crate::domain::{Result, SatchelError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

/// Worker pool size used when none is configured
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Export driver
///
/// # Example
///
/// ```no_run
/// use satchel::adapters::storage::{FileSubmissionStore, JsonLinesWriter};
/// use satchel::core::cache::{DefinitionCache, MemoryCacheStore};
/// use satchel::core::export::{CancellationToken, ExportConfiguration, ExportDriver, FormRegistry};
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
///
/// # async fn example() -> satchel::domain::Result<()> {
/// let cache = Arc::new(DefinitionCache::open(Arc::new(MemoryCacheStore::new()))?);
/// let scan = cache.scan("/var/lib/satchel".as_ref())?;
/// let registry = Arc::new(FormRegistry::load(
///     ExportConfiguration::empty().with_output_directory("/tmp/exports"),
///     scan.definitions,
///     &BTreeMap::new(),
/// )?);
/// registry.select_all();
///
/// let driver = ExportDriver::new(
///     cache,
///     Arc::new(FileSubmissionStore::new("/var/lib/satchel")),
///     Arc::new(JsonLinesWriter),
/// )
/// .with_pool_size(2);
///
/// let report = driver.run(registry, &CancellationToken::new()).await;
/// println!("{}", report.summary_text());
/// # Ok(())
/// # }
/// ```
pub struct ExportDriver {
    pool_size: usize,
    cache: Arc<DefinitionCache>,
    store: Arc<dyn SubmissionStore>,
    writer: Arc<dyn ExportWriter>,
    remote: Option<Arc<dyn RemoteSource>>,
    sink: Arc<dyn StatusSink>,
}

impl ExportDriver {
    pub fn new(
        cache: Arc<DefinitionCache>,
        store: Arc<dyn SubmissionStore>,
        writer: Arc<dyn ExportWriter>,
    ) -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            cache,
            store,
            writer,
            remote: None,
            sink: Arc::new(TracingStatusSink),
        }
    }

    /// Maximum number of jobs running at once (at least 1)
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Remote server used by forms configured to pull before export
    pub fn with_remote(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Extra sink receiving every status update (the registry always does)
    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Export every selected form and wait for all jobs to finish
    ///
    /// Forms whose effective configuration is invalid fail with a
    /// configuration error without being dispatched. Once cancellation is
    /// observed no further job is dispatched; running jobs stop at their next
    /// checkpoint. The report lists every form in snapshot order.
    pub async fn run(&self, registry: Arc<FormRegistry>, token: &CancellationToken) -> ExportReport {
        let _run_guard = token.enter_run();
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("export_run", run_id = %run_id);

        self.run_inner(run_id, registry, token).instrument(span).await
    }

    /// Blocking entry point driving a dedicated runtime
    ///
    /// Must not be called from within an async context.
    pub fn run_blocking(
        &self,
        registry: Arc<FormRegistry>,
        token: &CancellationToken,
    ) -> Result<ExportReport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.pool_size)
            .enable_all()
            .build()
            .map_err(|e| SatchelError::Other(format!("Failed to start export runtime: {e}")))?;
        Ok(runtime.block_on(self.run(registry, token)))
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        registry: Arc<FormRegistry>,
        token: &CancellationToken,
    ) -> ExportReport {
        let start_time = Instant::now();
        let snapshot = registry.selection_snapshot();
        let mut slots: Vec<Option<FormOutcome>> = vec![None; snapshot.len()];

        let mut dispatchable = Vec::with_capacity(snapshot.len());
        for (index, form) in snapshot.iter().enumerate() {
            let validation = form.configuration.validate();
            if validation.is_valid() {
                dispatchable.push(index);
                continue;
            }

            let message = format!("Invalid export configuration: {}", validation.message());
            registry.clear_status_history(&form.definition.id);
            registry.notify(&form.definition.id, &message, true);
            self.sink.notify(&form.definition.id, &message, true);
            slots[index] = Some(FormOutcome::Failed {
                kind: ErrorKind::Configuration,
                message,
            });
        }

        let parallelism = dispatchable.len().clamp(1, self.pool_size);
        crate::log_run_start!(run_id, snapshot.len(), parallelism);

        let ctx = JobContext {
            cache: self.cache.clone(),
            store: self.store.clone(),
            writer: self.writer.clone(),
            remote: self.remote.clone(),
            sink: self.sink.clone(),
            registry: registry.clone(),
        };
        let semaphore = Arc::new(Semaphore::new(parallelism));
        let mut jobs = JoinSet::new();

        for index in dispatchable {
            if token.is_cancelled() {
                slots[index] = Some(FormOutcome::Cancelled);
                continue;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    slots[index] = Some(FormOutcome::Cancelled);
                    continue;
                }
            };
            if token.is_cancelled() {
                slots[index] = Some(FormOutcome::Cancelled);
                continue;
            }

            let form = snapshot[index].clone();
            let job = ExportJob::new(form, ctx.clone(), token.clone());
            jobs.spawn(
                async move {
                    let _permit = permit;
                    (index, job.run().await)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((index, Ok(success))) => {
                    registry.record_successful_export(&snapshot[index].definition.id, Utc::now());
                    slots[index] = Some(FormOutcome::Succeeded {
                        exported: success.exported,
                        output: success.output,
                    });
                }
                Ok((index, Err(e))) => slots[index] = Some(FormOutcome::from_error(&e)),
                Err(e) => tracing::error!(error = %e, "Export job terminated abnormally"),
            }
        }

        let mut report = ExportReport::new(run_id);
        for (form, slot) in snapshot.iter().zip(slots) {
            let outcome = slot.unwrap_or_else(|| FormOutcome::Failed {
                kind: ErrorKind::Other,
                message: "Export job terminated abnormally".to_string(),
            });
            crate::log_form_outcome!(&form.definition.id, &outcome);
            report.push(FormResult {
                form_id: form.definition.id.clone(),
                title: form.definition.title.clone(),
                outcome,
            });
        }

        let report = report.with_duration(start_time.elapsed());
        report.log_summary();
        report
    }
}
