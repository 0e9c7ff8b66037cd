//! Content-addressed cache of parsed form definitions
//!
//! Each entry maps a definition file path to the digest of the bytes it was
//! parsed from. A lookup re-hashes the live file; the cached definition is
//! only served while the digests match.

use super::digest::{digest_bytes, digest_file, Digest};
use super::store::{CacheEntry, CacheStore};
use crate::domain::context::ResultExt;
use crate::domain::form::FormDefinition;
use crate::domain::{Result, SatchelError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of a form definition inside its storage directory
pub const DEFINITION_FILE_NAME: &str = "form.json";

/// Parses raw definition bytes
pub trait FormParser: Send + Sync {
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<FormDefinition>;
}

/// Default parser for JSON definition documents
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormParser;

impl FormParser for JsonFormParser {
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<FormDefinition> {
        FormDefinition::from_json(path, bytes)
    }
}

/// Outcome of scanning a storage directory
#[derive(Debug, Default)]
pub struct ScanResult {
    pub definitions: Vec<FormDefinition>,
    pub failures: Vec<(PathBuf, SatchelError)>,
}

/// Definition cache shared by concurrent export jobs
///
/// Concurrent `get` calls for the same unchanged path may both parse; the
/// results are equal, so the last writer wins without harm.
pub struct DefinitionCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    store: Arc<dyn CacheStore>,
    parser: Arc<dyn FormParser>,
}

impl DefinitionCache {
    /// Open the cache with the default JSON parser, loading persisted entries
    pub fn open(store: Arc<dyn CacheStore>) -> Result<Self> {
        Self::with_parser(store, Arc::new(JsonFormParser))
    }

    /// Open the cache with a custom parser
    pub fn with_parser(store: Arc<dyn CacheStore>, parser: Arc<dyn FormParser>) -> Result<Self> {
        let entries: HashMap<PathBuf, CacheEntry> = store
            .load_all()?
            .into_iter()
            .map(|entry| (entry.file_path.clone(), entry))
            .collect();

        tracing::debug!(entries = entries.len(), "Loaded definition cache");

        Ok(Self {
            entries: RwLock::new(entries),
            store,
            parser,
        })
    }

    /// Resolve the definition stored at `file_path`
    ///
    /// Serves the cached definition when the live digest matches; otherwise
    /// parses the file and replaces the entry.
    ///
    /// # Errors
    ///
    /// - `SatchelError::Io` if the file cannot be read
    /// - `SatchelError::Parse` if the file is malformed; a stale entry, if any,
    ///   is left untouched and the parse is retried on the next call
    pub fn get(&self, file_path: &Path) -> Result<FormDefinition> {
        let bytes = fs::read(file_path)
            .with_context(|| format!("Failed to read form definition {}", file_path.display()))?;
        let digest = digest_bytes(&bytes);

        if let Some(entry) = self.entries.read().get(file_path) {
            if entry.digest == digest {
                tracing::trace!(path = %file_path.display(), "Definition cache hit");
                return Ok(entry.definition.clone());
            }
        }

        tracing::debug!(path = %file_path.display(), digest = %digest, "Parsing form definition");
        let definition = self.parser.parse(file_path, &bytes)?;

        let entry = CacheEntry {
            file_path: file_path.to_path_buf(),
            digest,
            definition: definition.clone(),
        };

        if let Err(e) = self.store.put(&entry) {
            tracing::warn!(
                path = %file_path.display(),
                error = %e,
                "Failed to persist definition cache entry"
            );
        }
        self.entries.write().insert(entry.file_path.clone(), entry);

        Ok(definition)
    }

    /// Whether the cached entry for `file_path` still matches the live file
    ///
    /// Returns `Ok(false)` when there is no entry.
    pub fn is_fresh(&self, file_path: &Path) -> Result<bool> {
        let cached = match self.entries.read().get(file_path) {
            Some(entry) => entry.digest.clone(),
            None => return Ok(false),
        };
        Ok(digest_file(file_path)? == cached)
    }

    /// Drop the entry for a path; idempotent
    pub fn invalidate(&self, file_path: &Path) -> Result<()> {
        self.entries.write().remove(file_path);
        self.store.remove(file_path)
    }

    /// Drop every entry, returning the removed paths in sorted order
    pub fn clear_all(&self) -> Result<Vec<PathBuf>> {
        let mut entries = self.entries.write();
        let mut removed: Vec<PathBuf> = entries.keys().cloned().collect();
        for path in self.store.clear()? {
            if !entries.contains_key(&path) {
                removed.push(path);
            }
        }
        entries.clear();
        removed.sort();
        removed.dedup();

        tracing::info!(removed = removed.len(), "Cleared definition cache");
        Ok(removed)
    }

    /// Every cached definition, ordered by title then id
    pub fn forms(&self) -> Vec<FormDefinition> {
        let mut forms: Vec<FormDefinition> = self
            .entries
            .read()
            .values()
            .map(|entry| entry.definition.clone())
            .collect();
        forms.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        forms
    }

    /// Cached paths with their digests, ordered by path
    pub fn entries(&self) -> Vec<(PathBuf, Digest)> {
        let mut entries: Vec<(PathBuf, Digest)> = self
            .entries
            .read()
            .values()
            .map(|entry| (entry.file_path.clone(), entry.digest.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Resolve every definition under `<storage_root>/forms/*/form.json`
    ///
    /// Unreadable or malformed files are collected as failures, never fatal.
    pub fn scan(&self, storage_root: &Path) -> Result<ScanResult> {
        let forms_dir = storage_root.join("forms");
        let mut result = ScanResult::default();
        if !forms_dir.is_dir() {
            return Ok(result);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&forms_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path().join(DEFINITION_FILE_NAME))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in paths {
            match self.get(&path) {
                Ok(definition) => result.definitions.push(definition),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping form definition");
                    result.failures.push((path, e));
                }
            }
        }

        Ok(result)
    }
}
