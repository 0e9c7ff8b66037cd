//! Forms command implementation
//!
//! Lists locally stored forms with their selection-independent export state.

use super::open_context;
use crate::cli::EXIT_OK;
use clap::Args;

/// Arguments for the forms command
#[derive(Args, Debug)]
pub struct FormsArgs {
    /// Also print definition files that failed to parse
    #[arg(long)]
    pub show_failures: bool,
}

impl FormsArgs {
    /// Execute the forms command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let (registry, scan) = match ctx.load_registry() {
            Ok(loaded) => loaded,
            Err(e) => {
                println!("❌ Failed to load forms: {e}");
                return Ok(crate::cli::EXIT_CONFIG);
            }
        };

        println!("📋 {} form(s) in {}", registry.len(), ctx.config.storage.directory.display());
        println!();

        for entry in registry.forms() {
            let id = entry.form_id();
            let config_state = match registry.effective_configuration(id) {
                Ok(c) if c.is_valid() => "ready",
                _ => "needs configuration",
            };
            let last_export = entry
                .last_export
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());

            println!(
                "  {:<32} {:<24} {:<10} {:<20} {}{}",
                entry.definition.title,
                id.as_str(),
                entry.definition.version.as_deref().unwrap_or("-"),
                config_state,
                last_export,
                if entry.custom_configuration.is_some() { " (custom)" } else { "" },
            );
        }

        if !scan.failures.is_empty() {
            println!();
            println!("⚠️  {} definition file(s) could not be read", scan.failures.len());
            if self.show_failures {
                for (path, error) in &scan.failures {
                    println!("   {}: {error}", path.display());
                }
            }
        }

        Ok(EXIT_OK)
    }
}
