//! Durable storage for definition cache entries
//!
//! One record is kept per form source file, keyed by path, so a restart does
//! not force re-parsing of unchanged files.

use super::digest::Digest;
use crate::domain::form::{FormDefinition, FormField};
use crate::domain::ids::FormId;
use crate::domain::{Result, SatchelError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A validated cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub file_path: PathBuf,
    pub digest: Digest,
    pub definition: FormDefinition,
}

/// Persisted shape of a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    file_path: PathBuf,
    digest: Digest,
    form_id: FormId,
    form_version: Option<String>,
    title: String,
    #[serde(default)]
    fields: Vec<FormField>,
    #[serde(default)]
    encrypted: bool,
}

impl From<&CacheEntry> for CacheRecord {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            file_path: entry.file_path.clone(),
            digest: entry.digest.clone(),
            form_id: entry.definition.id.clone(),
            form_version: entry.definition.version.clone(),
            title: entry.definition.title.clone(),
            fields: entry.definition.fields.clone(),
            encrypted: entry.definition.encrypted,
        }
    }
}

impl From<CacheRecord> for CacheEntry {
    fn from(record: CacheRecord) -> Self {
        Self {
            definition: FormDefinition {
                id: record.form_id,
                version: record.form_version,
                title: record.title,
                source_path: record.file_path.clone(),
                fields: record.fields,
                encrypted: record.encrypted,
            },
            file_path: record.file_path,
            digest: record.digest,
        }
    }
}

/// Storage backend for cache entries
///
/// Must support point lookup by path (via `load_all`), full enumeration and full clear.
pub trait CacheStore: Send + Sync {
    /// Load every persisted entry
    fn load_all(&self) -> Result<Vec<CacheEntry>>;

    /// Insert or replace the entry for `entry.file_path`
    fn put(&self, entry: &CacheEntry) -> Result<()>;

    /// Remove the entry for a path; idempotent
    fn remove(&self, file_path: &Path) -> Result<()>;

    /// Remove every entry, returning the removed paths
    fn clear(&self) -> Result<Vec<PathBuf>>;
}

/// In-memory store, for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryCacheStore {
    records: Mutex<BTreeMap<PathBuf, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load_all(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.records.lock().values().cloned().collect())
    }

    fn put(&self, entry: &CacheEntry) -> Result<()> {
        self.records
            .lock()
            .insert(entry.file_path.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, file_path: &Path) -> Result<()> {
        self.records.lock().remove(file_path);
        Ok(())
    }

    fn clear(&self) -> Result<Vec<PathBuf>> {
        let mut records = self.records.lock();
        let removed = records.keys().cloned().collect();
        records.clear();
        Ok(removed)
    }
}

/// JSON file store
///
/// The whole map is rewritten on every mutation through a temporary file and
/// a rename, so a crash never leaves a truncated cache behind.
pub struct JsonFileCacheStore {
    path: PathBuf,
    records: Mutex<BTreeMap<PathBuf, CacheRecord>>,
}

impl JsonFileCacheStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                let list: Vec<CacheRecord> = serde_json::from_slice(&bytes).map_err(|e| {
                    SatchelError::Serialization(format!(
                        "Corrupt cache file {}: {e}",
                        path.display()
                    ))
                })?;
                list.into_iter().map(|r| (r.file_path.clone(), r)).collect()
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = records.len(), "Opened cache store");

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, records: &BTreeMap<PathBuf, CacheRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let list: Vec<&CacheRecord> = records.values().collect();
        let bytes = serde_json::to_vec_pretty(&list)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CacheStore for JsonFileCacheStore {
    fn load_all(&self) -> Result<Vec<CacheEntry>> {
        Ok(self
            .records
            .lock()
            .values()
            .cloned()
            .map(CacheEntry::from)
            .collect())
    }

    fn put(&self, entry: &CacheEntry) -> Result<()> {
        let mut records = self.records.lock();
        records.insert(entry.file_path.clone(), CacheRecord::from(entry));
        self.flush(&records)
    }

    fn remove(&self, file_path: &Path) -> Result<()> {
        let mut records = self.records.lock();
        if records.remove(file_path).is_some() {
            self.flush(&records)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<Vec<PathBuf>> {
        let mut records = self.records.lock();
        let removed: Vec<PathBuf> = records.keys().cloned().collect();
        records.clear();
        self.flush(&records)?;
        Ok(removed)
    }
}
