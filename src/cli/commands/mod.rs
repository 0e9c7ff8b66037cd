//! CLI command implementations
//!
//! Each command returns `anyhow::Result<i32>` carrying the process exit code.

pub mod clear;
pub mod configure;
pub mod export;
pub mod forms;
pub mod init;
pub mod pull;
pub mod validate;

use crate::cli::context::AppContext;
use crate::cli::EXIT_CONFIG;
use crate::config::load_config;

/// Load configuration and open the application context
///
/// Prints the failure and returns the exit code when either step fails.
pub(crate) fn open_context(config_path: &str) -> Result<AppContext, i32> {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("❌ {e}");
            return Err(EXIT_CONFIG);
        }
    };

    AppContext::open(config).map_err(|e| {
        crate::log_error_with_context!(&e, "Failed to open storage");
        eprintln!("❌ Failed to open storage: {e}");
        crate::cli::EXIT_FATAL
    })
}
