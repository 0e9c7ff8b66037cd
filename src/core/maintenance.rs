//! Administrative clear-cache / clear-preferences operation

use crate::core::cache::DefinitionCache;
use crate::core::preferences::Preferences;
use crate::domain::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// What a clear operation removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Removed keys per namespace, sorted
    pub removed_keys: BTreeMap<String, Vec<String>>,
    /// Definition files that were cached, sorted
    pub removed_cache_paths: Vec<PathBuf>,
}

impl ClearReport {
    pub fn total_keys(&self) -> usize {
        self.removed_keys.values().map(Vec::len).sum()
    }

    /// Diagnostic lines: one per removed key (`namespace: key`), then one per cache path
    pub fn lines(&self) -> Vec<String> {
        let keys = self
            .removed_keys
            .iter()
            .flat_map(|(ns, keys)| keys.iter().map(move |k| format!("{ns}: {k}")));
        let paths = self
            .removed_cache_paths
            .iter()
            .map(|p| format!("cache: {}", p.display()));
        keys.chain(paths).collect()
    }
}

/// Empties the definition cache and every preference namespace
pub struct ClearOperation {
    cache: Arc<DefinitionCache>,
    namespaces: Vec<Arc<dyn Preferences>>,
}

impl ClearOperation {
    pub fn new(cache: Arc<DefinitionCache>, namespaces: Vec<Arc<dyn Preferences>>) -> Self {
        Self { cache, namespaces }
    }

    pub fn execute(&self) -> Result<ClearReport> {
        let mut report = ClearReport {
            removed_cache_paths: self.cache.clear_all()?,
            ..ClearReport::default()
        };

        for prefs in &self.namespaces {
            let mut keys = prefs.keys();
            keys.sort();
            prefs.remove_all(&keys)?;
            tracing::debug!(namespace = prefs.namespace(), removed = keys.len(), "Cleared preferences");
            report.removed_keys.insert(prefs.namespace().to_string(), keys);
        }

        tracing::info!(
            keys = report.total_keys(),
            cache_entries = report.removed_cache_paths.len(),
            "Cleared cache and preferences"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::MemoryCacheStore;
    use crate::core::preferences::MemoryPreferences;
    use tempfile::TempDir;

    #[test]
    fn test_clear_reports_sorted_keys() {
        let dir = TempDir::new().unwrap();
        let form = dir.path().join("form.json");
        std::fs::write(&form, br#"{"id": "visits"}"#).unwrap();

        let cache = Arc::new(DefinitionCache::open(Arc::new(MemoryCacheStore::new())).unwrap());
        cache.get(&form).unwrap();

        let app = Arc::new(MemoryPreferences::new("app"));
        let export = Arc::new(MemoryPreferences::new("export"));
        export.put("visits::pull_before", "true").unwrap();
        export.put("export_dir", "/out").unwrap();

        let namespaces: Vec<Arc<dyn Preferences>> = vec![
            app as Arc<dyn Preferences>,
            export.clone() as Arc<dyn Preferences>,
        ];
        let report = ClearOperation::new(cache.clone(), namespaces)
            .execute()
            .unwrap();

        assert_eq!(report.removed_keys["app"], Vec::<String>::new());
        assert_eq!(report.removed_keys["export"], vec!["export_dir", "visits::pull_before"]);
        assert_eq!(report.removed_cache_paths, vec![form.clone()]);
        assert_eq!(report.total_keys(), 2);
        assert_eq!(report.lines()[0], "export: export_dir");
        assert!(cache.is_empty());
        assert!(export.keys().is_empty());
    }
}
