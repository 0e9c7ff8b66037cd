//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` to avoid
//! interfering with each other.

use satchel::config::load_config;
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Serializes tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "SATCHEL_APPLICATION_LOG_LEVEL",
        "SATCHEL_STORAGE_DIRECTORY",
        "SATCHEL_REMOTE_BASE_URL",
        "SATCHEL_REMOTE_USERNAME",
        "SATCHEL_REMOTE_PASSWORD",
        "SATCHEL_EXPORT_POOL_SIZE",
        "SATCHEL_LOGGING_LOCAL_ENABLED",
        "SATCHEL_LOGGING_LOCAL_PATH",
        "TEST_SATCHEL_PASSWORD",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[storage]
directory = "/srv/satchel"
cache_file = "/var/cache/satchel/cache.json"

[remote]
base_url = "https://collect.example.org/api/v1"
username = "collector"
password = "secret"
timeout_seconds = 30

[remote.retry]
max_retries = 5
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 1.5

[export]
pool_size = 8

[logging]
local_enabled = true
local_path = "/var/log/satchel"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.storage.directory, PathBuf::from("/srv/satchel"));
    assert_eq!(
        config.storage.cache_file(),
        PathBuf::from("/var/cache/satchel/cache.json")
    );
    assert_eq!(
        config.storage.preferences_dir(),
        PathBuf::from("/srv/satchel/.satchel/prefs")
    );

    let remote = config.remote.as_ref().unwrap();
    assert_eq!(remote.base_url, "https://collect.example.org/api/v1");
    assert_eq!(remote.username.as_deref(), Some("collector"));
    assert_eq!(remote.password.as_ref().unwrap().expose_secret().as_ref(), "secret");
    assert_eq!(remote.timeout_seconds, 30);
    assert_eq!(remote.retry.max_retries, 5);
    assert_eq!(remote.retry.backoff_multiplier, 1.5);

    assert_eq!(config.export.pool_size, 8);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config("[storage]\ndirectory = \"./data\"\n");
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(config.remote.is_none());
    assert_eq!(config.export.pool_size, 4);
    assert!(!config.logging.local_enabled);
    assert_eq!(
        config.storage.cache_file(),
        PathBuf::from("./data/.satchel/cache.json")
    );
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_SATCHEL_PASSWORD", "from-env");

    let temp_file = write_config(
        r#"
[storage]
directory = "./data"

[remote]
base_url = "https://collect.example.org"
username = "collector"
password = "${TEST_SATCHEL_PASSWORD}"
"#,
    );
    let config = load_config(temp_file.path()).unwrap();
    cleanup_env_vars();

    let password = config.remote.unwrap().password.unwrap();
    assert_eq!(password.expose_secret().as_ref(), "from-env");
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        "[storage]\ndirectory = \"./data\"\n[remote]\nbase_url = \"http://x\"\nusername = \"u\"\npassword = \"${TEST_SATCHEL_PASSWORD}\"\n",
    );
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_SATCHEL_PASSWORD"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SATCHEL_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("SATCHEL_EXPORT_POOL_SIZE", "2");
    std::env::set_var("SATCHEL_REMOTE_BASE_URL", "https://override.example.org");

    let temp_file = write_config("[storage]\ndirectory = \"./data\"\n[export]\npool_size = 16\n");
    let config = load_config(temp_file.path());
    cleanup_env_vars();
    let config = config.unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.export.pool_size, 2);
    assert_eq!(
        config.remote.unwrap().base_url,
        "https://override.example.org"
    );
}

#[test]
fn test_invalid_values_are_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        "[application]\nlog_level = \"loud\"\n[storage]\ndirectory = \"./d\"\n",
        "[storage]\ndirectory = \"./d\"\n[export]\npool_size = 65\n",
        "[storage]\ndirectory = \"./d\"\n[remote]\nbase_url = \"ftp://x\"\n",
        "[storage]\ndirectory = \"./d\"\n[remote]\nbase_url = \"http://x\"\nusername = \"u\"\n",
        "[storage]\ndirectory = \"./d\"\n[logging]\nlocal_rotation = \"weekly\"\n",
    ];
    for contents in cases {
        let temp_file = write_config(contents);
        assert!(
            load_config(temp_file.path()).is_err(),
            "expected rejection of:\n{contents}"
        );
    }
}
