//! Key/value preferences
//!
//! Preferences are flat string maps grouped into namespaces. The registry and
//! the CLI commands receive a [`Preferences`] handle explicitly; nothing in the
//! core reads preferences from ambient global state.

use crate::domain::{Result, SatchelError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application-wide namespace
pub const APP_NAMESPACE: &str = "app";
/// Pull command namespace
pub const PULL_NAMESPACE: &str = "pull";
/// Push command namespace
pub const PUSH_NAMESPACE: &str = "push";
/// Export configuration, selection and last-export namespace
pub const EXPORT_NAMESPACE: &str = "export";

/// Every namespace cleared by the clear-preferences operation
pub const ALL_NAMESPACES: [&str; 4] = [APP_NAMESPACE, PULL_NAMESPACE, PUSH_NAMESPACE, EXPORT_NAMESPACE];

/// A namespaced key/value store
pub trait Preferences: Send + Sync {
    /// Namespace name, used in diagnostics
    fn namespace(&self) -> &str;

    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: &str) -> Result<()>;

    fn put_all(&self, values: &BTreeMap<String, String>) -> Result<()>;

    fn remove_all(&self, keys: &[String]) -> Result<()>;

    /// Every key currently stored
    fn keys(&self) -> Vec<String>;

    /// Full snapshot of the namespace
    fn snapshot(&self) -> BTreeMap<String, String>;

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_all(&[key.to_string()])
    }
}

/// In-memory preferences
pub struct MemoryPreferences {
    namespace: String,
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            values: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Preferences for MemoryPreferences {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn put_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        self.values
            .write()
            .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn remove_all(&self, keys: &[String]) -> Result<()> {
        let mut values = self.values.write();
        for key in keys {
            values.remove(key);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.read().clone()
    }
}

/// Preferences persisted as a JSON object in `<dir>/<namespace>.json`
pub struct FilePreferences {
    namespace: String,
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Open the namespace file, creating nothing until the first write
    pub fn open(dir: &Path, namespace: &str) -> Result<Self> {
        let path = dir.join(format!("{namespace}.json"));
        let values = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes).map_err(|e| {
                SatchelError::Preferences(format!("Corrupt preferences {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            namespace: namespace.to_string(),
            path,
            values: RwLock::new(values),
        })
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            SatchelError::Preferences(format!("Failed to save {}: {e}", self.path.display()))
        })
    }
}

impl Preferences for FilePreferences {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn put_all(&self, new_values: &BTreeMap<String, String>) -> Result<()> {
        let mut values = self.values.write();
        values.extend(new_values.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.flush(&values)
    }

    fn remove_all(&self, keys: &[String]) -> Result<()> {
        let mut values = self.values.write();
        let before = values.len();
        for key in keys {
            values.remove(key);
        }
        if values.len() != before {
            self.flush(&values)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.read().clone()
    }
}

/// Open every known namespace from a preferences directory
pub fn open_all(dir: &Path) -> Result<Vec<Arc<dyn Preferences>>> {
    ALL_NAMESPACES
        .iter()
        .map(|ns| FilePreferences::open(dir, ns).map(|p| Arc::new(p) as Arc<dyn Preferences>))
        .collect()
}
