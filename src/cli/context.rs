//! Collaborators shared by the CLI commands

use crate::adapters::remote::{HttpRemoteSource, RemoteSource};
use crate::adapters::storage::FileSubmissionStore;
use crate::config::SatchelConfig;
use crate::core::cache::{DefinitionCache, JsonFileCacheStore, ScanResult};
use crate::core::export::FormRegistry;
use crate::core::preferences::{self, Preferences, EXPORT_NAMESPACE};
use crate::domain::{Result, SatchelError};
use std::sync::Arc;

/// Opened storage, cache and preferences for one command invocation
pub struct AppContext {
    pub config: SatchelConfig,
    pub cache: Arc<DefinitionCache>,
    pub store: Arc<FileSubmissionStore>,
    pub preferences: Vec<Arc<dyn Preferences>>,
}

impl AppContext {
    /// Open every local collaborator described by the configuration
    pub fn open(config: SatchelConfig) -> Result<Self> {
        let cache_store = Arc::new(JsonFileCacheStore::open(config.storage.cache_file())?);
        let cache = Arc::new(DefinitionCache::open(cache_store)?);
        let store = Arc::new(FileSubmissionStore::new(&config.storage.directory));
        let preferences = preferences::open_all(&config.storage.preferences_dir())?;

        tracing::debug!(
            storage = %config.storage.directory.display(),
            cached_definitions = cache.len(),
            "Opened application context"
        );

        Ok(Self {
            config,
            cache,
            store,
            preferences,
        })
    }

    /// The namespace holding export configuration and last-export dates
    pub fn export_preferences(&self) -> Result<Arc<dyn Preferences>> {
        self.preferences
            .iter()
            .find(|p| p.namespace() == EXPORT_NAMESPACE)
            .cloned()
            .ok_or_else(|| SatchelError::Preferences("export namespace is not open".to_string()))
    }

    /// HTTP remote source, if a `[remote]` section is configured
    pub fn remote(&self) -> Result<Option<Arc<dyn RemoteSource>>> {
        match &self.config.remote {
            Some(remote) => Ok(Some(
                Arc::new(HttpRemoteSource::new(remote.clone())?) as Arc<dyn RemoteSource>
            )),
            None => Ok(None),
        }
    }

    /// Scan local definitions and rebuild the registry from preferences
    pub fn load_registry(&self) -> Result<(FormRegistry, ScanResult)> {
        let mut scan = self.cache.scan(&self.config.storage.directory)?;
        let definitions = std::mem::take(&mut scan.definitions);
        let registry =
            FormRegistry::load_from_preferences(definitions, self.export_preferences()?.as_ref())?;
        Ok((registry, scan))
    }
}
