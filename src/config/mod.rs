//! Configuration management for Satchel.
//!
//! Satchel reads a TOML file (`satchel.toml` by default) with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SATCHEL_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use satchel::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("satchel.toml")?;
//! println!("Storage: {}", config.storage.directory.display());
//! println!("Pool size: {}", config.export.pool_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [storage]
//! directory = "/var/lib/satchel"
//!
//! [remote]
//! base_url = "https://collect.example.org/api/v1"
//! username = "collector"
//! password = "${SATCHEL_REMOTE_PASSWORD}"
//!
//! [export]
//! pool_size = 4
//!
//! [logging]
//! local_enabled = true
//! local_path = "/var/log/satchel"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ExportConfig, LoggingConfig, RemoteConfig, RetryConfig, SatchelConfig,
    StorageConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
