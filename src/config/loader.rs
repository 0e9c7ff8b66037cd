//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{RemoteConfig, SatchelConfig};
use super::secret::secret_string;
use crate::domain::errors::SatchelError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SatchelConfig
/// 4. Applies environment variable overrides (SATCHEL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `SatchelError::Configuration` if the file cannot be read, a
/// referenced environment variable is unset, the TOML is malformed, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use satchel::config::loader::load_config;
///
/// let config = load_config("satchel.toml")?;
/// println!("Storage root: {}", config.storage.directory.display());
/// # Ok::<(), satchel::domain::SatchelError>(())
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SatchelConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SatchelError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SatchelError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parse, override and validate configuration text
pub fn parse_config(contents: &str) -> Result<SatchelConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SatchelConfig = toml::from_str(&contents)
        .map_err(|e| SatchelError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        SatchelError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SatchelError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(SatchelError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the SATCHEL_* prefix
///
/// Environment variables follow the pattern `SATCHEL_<SECTION>_<KEY>`, for
/// example `SATCHEL_REMOTE_BASE_URL`. Setting any `SATCHEL_REMOTE_*` variable
/// creates the `[remote]` section when the file has none.
fn apply_env_overrides(config: &mut SatchelConfig) {
    if let Ok(val) = std::env::var("SATCHEL_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("SATCHEL_STORAGE_DIRECTORY") {
        config.storage.directory = PathBuf::from(val);
    }

    if let Ok(val) = std::env::var("SATCHEL_REMOTE_BASE_URL") {
        config.remote.get_or_insert_with(RemoteConfig::default).base_url = val;
    }
    if let Ok(val) = std::env::var("SATCHEL_REMOTE_USERNAME") {
        config.remote.get_or_insert_with(RemoteConfig::default).username = Some(val);
    }
    if let Ok(val) = std::env::var("SATCHEL_REMOTE_PASSWORD") {
        config.remote.get_or_insert_with(RemoteConfig::default).password =
            Some(secret_string(val));
    }

    if let Ok(val) = std::env::var("SATCHEL_REMOTE_PARALLEL_PULLS") {
        match val.parse() {
            Ok(count) => {
                config.remote.get_or_insert_with(RemoteConfig::default).parallel_pulls = count
            }
            Err(_) => tracing::warn!(value = %val, "Ignoring invalid SATCHEL_REMOTE_PARALLEL_PULLS"),
        }
    }

    if let Ok(val) = std::env::var("SATCHEL_EXPORT_POOL_SIZE") {
        match val.parse() {
            Ok(size) => config.export.pool_size = size,
            Err(_) => tracing::warn!(value = %val, "Ignoring invalid SATCHEL_EXPORT_POOL_SIZE"),
        }
    }

    if let Ok(val) = std::env::var("SATCHEL_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SATCHEL_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
