//! Configuration schema types
//!
//! This module defines the configuration structure mapped from `satchel.toml`.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest accepted worker pool size
pub const MAX_POOL_SIZE: usize = 64;

/// Main Satchel configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatchelConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Local form storage
    pub storage: StorageConfig,

    /// Remote collection server (optional; required for pulling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SatchelConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.storage.validate()?;
        if let Some(remote) = &self.remote {
            remote.validate()?;
        }
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Local storage layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the local form storage (`<directory>/forms/<form_id>/...`)
    pub directory: PathBuf,

    /// Definition cache store; defaults to `<directory>/.satchel/cache.json`
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    /// Preferences directory; defaults to `<directory>/.satchel/prefs`
    #[serde(default)]
    pub preferences_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn cache_file(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| self.directory.join(".satchel").join("cache.json"))
    }

    pub fn preferences_dir(&self) -> PathBuf {
        self.preferences_dir
            .clone()
            .unwrap_or_else(|| self.directory.join(".satchel").join("prefs"))
    }

    fn validate(&self) -> Result<(), String> {
        if self.directory.as_os_str().is_empty() {
            return Err("storage.directory cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("remote.retry.max_retries must be > 0".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("remote.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(
                "remote.retry.initial_delay_ms cannot exceed remote.retry.max_delay_ms".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Remote collection server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the collection server API
    pub base_url: String,

    /// Username for basic authentication (optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Number of forms pulled concurrently (1 pulls one form at a time)
    #[serde(default = "default_parallel_pulls")]
    pub parallel_pulls: usize,
}

impl RemoteConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("remote.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("remote.base_url must start with http:// or https://".to_string());
        }

        let has_username = self.username.as_ref().is_some_and(|u| !u.is_empty());
        let has_password = self
            .password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty());
        if has_username != has_password {
            return Err("remote.username and remote.password must be set together".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("remote.timeout_seconds must be > 0".to_string());
        }

        if self.parallel_pulls == 0 || self.parallel_pulls > MAX_POOL_SIZE {
            return Err(format!(
                "remote.parallel_pulls must be between 1 and {MAX_POOL_SIZE}, got {}",
                self.parallel_pulls
            ));
        }

        self.retry.validate()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            username: None,
            password: None,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
            parallel_pulls: default_parallel_pulls(),
        }
    }
}

/// Export run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Size of the bounded worker pool running export jobs
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 || self.pool_size > MAX_POOL_SIZE {
            return Err(format!(
                "export.pool_size must be between 1 and {MAX_POOL_SIZE}, got {}",
                self.pool_size
            ));
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_pool_size() -> usize {
    4
}

fn default_parallel_pulls() -> usize {
    1
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use test_case::test_case;

    fn storage() -> StorageConfig {
        StorageConfig {
            directory: PathBuf::from("/data/satchel"),
            cache_file: None,
            preferences_dir: None,
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_defaults_derive_from_directory() {
        let storage = storage();
        assert_eq!(
            storage.cache_file(),
            PathBuf::from("/data/satchel/.satchel/cache.json")
        );
        assert_eq!(
            storage.preferences_dir(),
            PathBuf::from("/data/satchel/.satchel/prefs")
        );
    }

    #[test_case(0, false ; "zero")]
    #[test_case(1, true ; "minimum")]
    #[test_case(64, true ; "maximum")]
    #[test_case(65, false ; "too large")]
    fn test_pool_size_bounds(pool_size: usize, valid: bool) {
        let config = ExportConfig { pool_size };
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn test_remote_config_validation() {
        let mut config = RemoteConfig {
            base_url: "https://collect.example.org/api/v1".to_string(),
            username: Some("collector".to_string()),
            password: Some(secret_string("pass".to_string())),
            ..RemoteConfig::default()
        };
        assert!(config.validate().is_ok());

        config.password = None;
        assert!(config
            .validate()
            .unwrap_err()
            .contains("must be set together"));

        config.username = None;
        assert!(config.validate().is_ok());

        config.parallel_pulls = 0;
        assert!(config.validate().unwrap_err().contains("parallel_pulls"));
        config.parallel_pulls = 8;
        assert!(config.validate().is_ok());

        config.base_url = "ftp://collect.example.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_validation() {
        let mut retry = RetryConfig::default();
        assert!(retry.validate().is_ok());

        retry.max_retries = 0;
        assert!(retry.validate().is_err());

        retry.max_retries = 3;
        retry.initial_delay_ms = 60_000;
        assert!(retry.validate().is_err());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut logging = LoggingConfig::default();
        assert!(logging.validate().is_ok());

        logging.local_rotation = "size".to_string();
        assert!(logging.validate().is_err());
    }

    #[test]
    fn test_full_config_validation() {
        let config = SatchelConfig {
            application: ApplicationConfig::default(),
            storage: storage(),
            remote: None,
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(config.validate().is_ok());
    }
}
