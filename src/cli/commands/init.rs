//! Init command implementation
//!
//! Writes a starter configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "satchel.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Satchel configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::starter_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} and point [storage] at your forms directory", self.output);
                println!("  2. Set SATCHEL_REMOTE_USERNAME and SATCHEL_REMOTE_PASSWORD in .env");
                println!("  3. Validate configuration: satchel validate-config");
                println!("  4. Pull forms: satchel pull --all");
                println!("  5. Set an output directory: satchel configure --output-dir ./exports");
                println!("  6. Run export: satchel export --all");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn starter_config() -> &'static str {
        r#"# Satchel Configuration File

[application]
log_level = "info"

[storage]
# Root holding forms/<form_id>/form.json and submitted instances
directory = "./satchel-data"

[remote]
base_url = "http://localhost:8080/api/v1"
username = "${SATCHEL_REMOTE_USERNAME}"
password = "${SATCHEL_REMOTE_PASSWORD}"
timeout_seconds = 60
# Number of forms pulled concurrently
parallel_pulls = 1

[remote.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[export]
# Number of forms exported concurrently
pool_size = 4

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_starter_config_parses_with_credentials() {
        let contents = InitArgs::starter_config()
            .replace("${SATCHEL_REMOTE_USERNAME}", "collector")
            .replace("${SATCHEL_REMOTE_PASSWORD}", "hunter2");
        let config = parse_config(&contents).unwrap();
        assert_eq!(config.export.pool_size, 4);
        assert!(config.remote.is_some());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("satchel.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[storage]"));
    }
}
