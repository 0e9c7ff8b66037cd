//! Integration tests for the persistent definition cache

use satchel::core::cache::{DefinitionCache, FormParser, JsonFileCacheStore};
use satchel::domain::{FormDefinition, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Default)]
struct CountingParser(AtomicUsize);

impl FormParser for CountingParser {
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<FormDefinition> {
        self.0.fetch_add(1, Ordering::SeqCst);
        FormDefinition::from_json(path, bytes)
    }
}

fn write_form(root: &Path, id: &str, title: &str) -> PathBuf {
    let dir = root.join("forms").join(id);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("form.json");
    fs::write(&path, format!(r#"{{"id": "{id}", "title": "{title}"}}"#)).unwrap();
    path
}

fn open_cache(cache_file: &Path, parser: Arc<CountingParser>) -> DefinitionCache {
    let store = Arc::new(JsonFileCacheStore::open(cache_file).unwrap());
    DefinitionCache::with_parser(store, parser).unwrap()
}

#[test]
fn test_unchanged_files_are_parsed_once_across_restarts() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("storage");
    let cache_file = dir.path().join("state").join("cache.json");
    let path = write_form(&root, "visits", "Visits");

    let parser = Arc::new(CountingParser::default());
    {
        let cache = open_cache(&cache_file, parser.clone());
        assert_eq!(cache.get(&path).unwrap().title, "Visits");
        assert_eq!(cache.get(&path).unwrap().title, "Visits");
    }
    assert_eq!(parser.0.load(Ordering::SeqCst), 1);
    assert!(cache_file.exists());

    let reopened = open_cache(&cache_file, parser.clone());
    assert!(reopened.is_fresh(&path).unwrap());
    assert_eq!(reopened.get(&path).unwrap().title, "Visits");
    assert_eq!(parser.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_changed_bytes_trigger_reparse() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("storage");
    let path = write_form(&root, "visits", "Visits");

    let parser = Arc::new(CountingParser::default());
    let cache = open_cache(&dir.path().join("cache.json"), parser.clone());
    cache.get(&path).unwrap();

    write_form(&root, "visits", "Clinic Visits");
    assert!(!cache.is_fresh(&path).unwrap());
    assert_eq!(cache.get(&path).unwrap().title, "Clinic Visits");
    assert_eq!(parser.0.load(Ordering::SeqCst), 2);
}

#[test]
fn test_clear_all_forces_reparse_and_reports_paths() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("storage");
    let a = write_form(&root, "a", "A");
    let b = write_form(&root, "b", "B");

    let parser = Arc::new(CountingParser::default());
    let cache = open_cache(&dir.path().join("cache.json"), parser.clone());
    let scan = cache.scan(&root).unwrap();
    assert_eq!(scan.definitions.len(), 2);

    let mut cleared = cache.clear_all().unwrap();
    cleared.sort();
    assert_eq!(cleared, vec![a.clone(), b]);
    assert!(cache.is_empty());

    cache.get(&a).unwrap();
    assert_eq!(parser.0.load(Ordering::SeqCst), 3);
}

#[test]
fn test_scan_collects_failures_without_aborting() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("storage");
    write_form(&root, "good", "Good");
    let broken_dir = root.join("forms").join("broken");
    fs::create_dir_all(&broken_dir).unwrap();
    fs::write(broken_dir.join("form.json"), b"{ not json").unwrap();

    let cache = open_cache(&dir.path().join("cache.json"), Arc::new(CountingParser::default()));
    let scan = cache.scan(&root).unwrap();

    assert_eq!(scan.definitions.len(), 1);
    assert_eq!(scan.definitions[0].id.as_str(), "good");
    assert_eq!(scan.failures.len(), 1);
    assert!(scan.failures[0].0.ends_with("broken/form.json"));
}
