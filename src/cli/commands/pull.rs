//! Pull command implementation
//!
//! Downloads form definitions and submissions from the remote server into
//! local storage, several forms at a time when `remote.parallel_pulls` allows.

use super::open_context;
use crate::adapters::remote::RemoteSource;
use crate::adapters::storage::SubmissionStore;
use crate::cli::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_OK, EXIT_PARTIAL};
use crate::core::cache::DefinitionCache;
use crate::domain::{FormDefinition, FormId, Result, SatchelError, TransferError};
use clap::Args;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Arguments for the pull command
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Form id to pull (repeatable)
    #[arg(short, long)]
    pub form: Vec<String>,

    /// Pull every form the server publishes
    #[arg(long, conflicts_with = "form")]
    pub all: bool,

    /// Only list the forms the server publishes
    #[arg(long, conflicts_with_all = ["form", "all"])]
    pub list: bool,
}

impl PullArgs {
    /// Execute the pull command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let remote = match ctx.remote() {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                println!("❌ No [remote] section configured");
                return Ok(EXIT_CONFIG);
            }
            Err(e) => {
                println!("❌ Failed to create remote client: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let form_ids = if self.list || self.all {
            let forms = match remote.list_forms().await {
                Ok(forms) => forms,
                Err(e) => {
                    crate::log_error_with_context!(&e, "Failed to list remote forms");
                    println!("❌ Failed to list remote forms: {e}");
                    return Ok(exit_code_for(&e));
                }
            };

            if self.list {
                println!("🌐 {} form(s) on the server", forms.len());
                for form in &forms {
                    println!(
                        "  {:<24} {:<10} {}",
                        form.id.as_str(),
                        form.version.as_deref().unwrap_or("-"),
                        form.title.as_deref().unwrap_or("")
                    );
                }
                return Ok(EXIT_OK);
            }
            forms.into_iter().map(|f| f.id).collect()
        } else {
            let mut ids = Vec::with_capacity(self.form.len());
            for raw in &self.form {
                match FormId::new(raw.as_str()) {
                    Ok(id) => ids.push(id),
                    Err(e) => {
                        println!("❌ Invalid form id '{raw}': {e}");
                        return Ok(EXIT_CONFIG);
                    }
                }
            }
            ids
        };

        if form_ids.is_empty() {
            println!("⚠️  Nothing to pull. Use --form <id> or --all");
            return Ok(EXIT_CONFIG);
        }

        let parallelism = ctx
            .config
            .remote
            .as_ref()
            .map_or(1, |r| r.parallel_pulls)
            .clamp(1, form_ids.len());
        println!(
            "⬇️  Pulling {} form(s), {parallelism} at a time",
            form_ids.len()
        );

        let total = form_ids.len();
        let results = pull_all(
            ctx.cache.clone(),
            ctx.store.clone(),
            remote,
            form_ids,
            parallelism,
        )
        .await;

        let mut failures = 0;
        let mut unreachable = false;
        for (form_id, result) in results {
            match result {
                Ok(saved) => println!("  ✅ {form_id}: {saved} submission(s)"),
                Err(e) => {
                    crate::log_error_with_context!(&e, "Pull failed", form_id = %form_id);
                    println!("  ❌ {form_id}: {e}");
                    failures += 1;
                    unreachable |= exit_code_for(&e) == EXIT_CONNECTION;
                }
            }
        }

        Ok(match failures {
            0 => EXIT_OK,
            n if n == total && unreachable => EXIT_CONNECTION,
            _ => EXIT_PARTIAL,
        })
    }
}

/// Pull forms with at most `parallelism` in flight
///
/// A failing form does not affect the others. Results follow the order of
/// `form_ids`.
async fn pull_all(
    cache: Arc<DefinitionCache>,
    store: Arc<dyn SubmissionStore>,
    remote: Arc<dyn RemoteSource>,
    form_ids: Vec<FormId>,
    parallelism: usize,
) -> Vec<(FormId, Result<usize>)> {
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut pulls = JoinSet::new();

    for (index, form_id) in form_ids.iter().cloned().enumerate() {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let cache = cache.clone();
        let store = store.clone();
        let remote = remote.clone();
        pulls.spawn(async move {
            let _permit = permit;
            let result = pull_form(&cache, store.as_ref(), remote.as_ref(), &form_id).await;
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<usize>>> = form_ids.iter().map(|_| None).collect();
    while let Some(joined) = pulls.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => tracing::error!(error = %e, "Pull task terminated abnormally"),
        }
    }

    form_ids
        .into_iter()
        .zip(slots)
        .map(|(form_id, slot)| {
            let result = slot.unwrap_or_else(|| {
                Err(SatchelError::Other("Pull task terminated abnormally".to_string()))
            });
            (form_id, result)
        })
        .collect()
}

/// Install the definition, refresh the cache and store submissions
///
/// The fetched definition must declare the requested form id; otherwise
/// nothing is written.
async fn pull_form(
    cache: &Arc<DefinitionCache>,
    store: &dyn SubmissionStore,
    remote: &dyn RemoteSource,
    form_id: &FormId,
) -> Result<usize> {
    let document = remote.fetch_definition(form_id).await?;
    let declared = FormDefinition::from_json(&store.definition_path(form_id), &document)?;
    if &declared.id != form_id {
        return Err(SatchelError::Parse(format!(
            "Definition fetched for {form_id} declares form id {}",
            declared.id
        )));
    }

    let path = store.install_definition(form_id, &document).await?;
    let cache = cache.clone();
    tokio::task::spawn_blocking(move || cache.get(&path))
        .await
        .map_err(|e| SatchelError::Other(format!("Definition task failed: {e}")))??;

    let submissions = remote.fetch_submissions(form_id).await?;
    store.save_submissions(form_id, &submissions).await
}

fn exit_code_for(error: &SatchelError) -> i32 {
    match error {
        SatchelError::Transfer(TransferError::ConnectionFailed(_))
        | SatchelError::Transfer(TransferError::Timeout(_)) => EXIT_CONNECTION,
        _ => EXIT_PARTIAL,
    }
}
