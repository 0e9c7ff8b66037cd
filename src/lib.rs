// Satchel - form submission pull and export tool
// Copyright (c) 2025 Satchel Contributors
// Licensed under the MIT License

//! # Satchel - form submission pull and export
//!
//! Satchel keeps a local store of data-collection forms and their submitted
//! instances, pulls new ones from a collection server, and exports selected
//! forms to JSON Lines files.
//!
//! ## Overview
//!
//! This library provides:
//! - **Caching** parsed form definitions keyed by file path and content digest
//! - **Selecting** forms and layering per-form export configuration over a default
//! - **Exporting** every selected form concurrently on a bounded worker pool,
//!   with cooperative cancellation and a per-form outcome report
//! - **Maintaining** preferences and cache through an administrative clear operation
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (cache, preferences, export, transform, maintenance)
//! - [`adapters`] - External integrations (remote server, local storage, output files)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use satchel::adapters::storage::{FileSubmissionStore, JsonLinesWriter};
//! use satchel::config::load_config;
//! use satchel::core::cache::{DefinitionCache, JsonFileCacheStore};
//! use satchel::core::export::{CancellationToken, ExportConfiguration, ExportDriver, FormRegistry};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("satchel.toml")?;
//!
//!     let store = Arc::new(JsonFileCacheStore::open(config.storage.cache_file())?);
//!     let cache = Arc::new(DefinitionCache::open(store)?);
//!     let scan = cache.scan(&config.storage.directory)?;
//!
//!     let registry = Arc::new(FormRegistry::load(
//!         ExportConfiguration::empty().with_output_directory("./exports"),
//!         scan.definitions,
//!         &BTreeMap::new(),
//!     )?);
//!     registry.select_all();
//!
//!     let driver = ExportDriver::new(
//!         cache,
//!         Arc::new(FileSubmissionStore::new(&config.storage.directory)),
//!         Arc::new(JsonLinesWriter),
//!     );
//!     let report = driver.run(registry, &CancellationToken::new()).await;
//!
//!     println!("{}", report.summary_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`] with [`domain::SatchelError`].
//! Per-form export failures never abort a run; they are classified by
//! [`domain::ErrorKind`] in the run's [`core::export::ExportReport`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
