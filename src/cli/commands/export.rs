//! Export command implementation
//!
//! Selects forms, runs the export driver and persists the last-export dates.

use super::open_context;
use crate::adapters::storage::JsonLinesWriter;
use crate::cli::{EXIT_CONFIG, EXIT_OK, EXIT_PARTIAL};
use crate::core::export::{CancellationToken, ExportDriver, FormRegistry};
use crate::domain::FormId;
use clap::Args;
use std::sync::Arc;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Form id to export (repeatable)
    #[arg(short, long)]
    pub form: Vec<String>,

    /// Export every stored form
    #[arg(long, conflicts_with = "form")]
    pub all: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        cancellation: CancellationToken,
    ) -> anyhow::Result<i32> {
        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };
        let (registry, scan) = match ctx.load_registry() {
            Ok(loaded) => loaded,
            Err(e) => {
                println!("❌ Failed to load forms: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        for (path, error) in &scan.failures {
            tracing::warn!(path = %path.display(), error = %error, "Skipping unreadable definition");
        }

        if let Err(message) = self.select(&registry) {
            println!("❌ {message}");
            return Ok(EXIT_CONFIG);
        }
        if !registry.some_selected() {
            println!("⚠️  No forms selected. Use --form <id> or --all");
            return Ok(EXIT_CONFIG);
        }
        if !registry.all_selected_have_valid_configuration() {
            println!("⚠️  Some selected forms have an invalid export configuration");
            println!("   They will be reported as failed. See `satchel forms`");
        }

        let remote = match ctx.remote() {
            Ok(remote) => remote,
            Err(e) => {
                println!("❌ Failed to create remote client: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let mut driver = ExportDriver::new(
            ctx.cache.clone(),
            ctx.store.clone(),
            Arc::new(JsonLinesWriter),
        )
        .with_pool_size(ctx.config.export.pool_size);
        if let Some(remote) = remote {
            driver = driver.with_remote(remote);
        }

        let selected = registry.selected_forms().len();
        println!(
            "📦 Exporting {selected} form(s) with up to {} worker(s)",
            driver.pool_size()
        );
        println!();

        let registry = Arc::new(registry);
        let report = driver.run(registry.clone(), &cancellation).await;

        if let Err(e) = registry.persist_last_exports(ctx.export_preferences()?.as_ref()) {
            crate::log_error_with_context!(&e, "Failed to save last export dates");
            println!("⚠️  Failed to save last export dates: {e}");
        }

        println!("{}", report.summary_text());
        println!();
        println!(
            "⏱️  {} succeeded, {} failed, {} cancelled in {:.1}s",
            report.succeeded(),
            report.failed(),
            report.cancelled(),
            report.duration.as_secs_f64()
        );

        Ok(if report.is_successful() {
            EXIT_OK
        } else {
            EXIT_PARTIAL
        })
    }

    fn select(&self, registry: &FormRegistry) -> Result<(), String> {
        if self.all {
            registry.select_all();
            return Ok(());
        }

        for raw in &self.form {
            let form_id = FormId::new(raw.as_str()).map_err(|e| format!("Invalid form id '{raw}': {e}"))?;
            registry
                .set_selected(&form_id, true)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::ExportConfiguration;
    use crate::domain::FormDefinition;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn registry() -> FormRegistry {
        let forms = ["a", "b"]
            .iter()
            .map(|id| {
                let path = format!("/forms/{id}/form.json");
                FormDefinition::from_json(Path::new(&path), format!(r#"{{"id": "{id}"}}"#).as_bytes())
                    .unwrap()
            })
            .collect();
        FormRegistry::load(ExportConfiguration::empty(), forms, &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_select_named_forms() {
        let registry = registry();
        let args = ExportArgs {
            form: vec!["b".to_string()],
            all: false,
        };
        args.select(&registry).unwrap();
        let selected: Vec<_> = registry
            .selected_forms()
            .into_iter()
            .map(|e| e.form_id().to_string())
            .collect();
        assert_eq!(selected, vec!["b"]);
    }

    #[test]
    fn test_select_unknown_form_fails() {
        let registry = registry();
        let args = ExportArgs {
            form: vec!["zzz".to_string()],
            all: false,
        };
        assert!(args.select(&registry).is_err());
        assert!(!registry.some_selected());
    }

    #[test]
    fn test_select_all() {
        let registry = registry();
        let args = ExportArgs {
            form: Vec::new(),
            all: true,
        };
        args.select(&registry).unwrap();
        assert!(registry.all_selected());
    }
}
