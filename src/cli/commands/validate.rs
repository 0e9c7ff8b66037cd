//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Satchel configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after applying overrides
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Storage: {}", config.storage.directory.display());
        println!("  Cache File: {}", config.storage.cache_file().display());
        println!("  Preferences: {}", config.storage.preferences_dir().display());
        match &config.remote {
            Some(remote) => {
                println!("  Remote Server: {}", remote.base_url);
                println!(
                    "  Authentication: {}",
                    if remote.username.is_some() { "basic" } else { "none" }
                );
                println!("  Max Retries: {}", remote.retry.max_retries);
            }
            None => println!("  Remote Server: (not configured)"),
        }
        println!("  Export Pool Size: {}", config.export.pool_size);
        if config.logging.local_enabled {
            println!(
                "  Log Files: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();

        Ok(0)
    }
}
