//! Clear-prefs command implementation

use super::open_context;
use crate::cli::{EXIT_FATAL, EXIT_OK};
use crate::core::maintenance::ClearOperation;
use clap::Args;

/// Arguments for the clear-prefs command
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Only print the number of removed entries
    #[arg(short, long)]
    pub quiet: bool,
}

impl ClearArgs {
    /// Execute the clear-prefs command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let operation = ClearOperation::new(ctx.cache.clone(), ctx.preferences.clone());
        let report = match operation.execute() {
            Ok(report) => report,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to clear preferences");
                println!("❌ Failed to clear preferences: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if !self.quiet {
            for line in report.lines() {
                println!("  {line}");
            }
        }
        println!(
            "🧹 Removed {} preference(s) and {} cached definition(s)",
            report.total_keys(),
            report.removed_cache_paths.len()
        );
        Ok(EXIT_OK)
    }
}
