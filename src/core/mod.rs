//! Core business logic for Satchel.
//!
//! # Modules
//!
//! - [`cache`] - content-addressed cache of parsed form definitions
//! - [`preferences`] - namespaced key/value preferences
//! - [`export`] - form registry, export configuration and the export driver
//! - [`transform`] - submission to export-row transformation
//! - [`maintenance`] - clearing cached and persisted state
//!
//! # Export Workflow
//!
//! 1. **Scan**: resolve every stored definition through the [`cache::DefinitionCache`]
//! 2. **Load**: rebuild the [`export::FormRegistry`] from the definitions and preferences
//! 3. **Select**: choose forms and configure overrides
//! 4. **Run**: the [`export::ExportDriver`] exports every selected form in parallel
//! 5. **Report**: failures and cancellations are summarized per form

pub mod cache;
pub mod export;
pub mod maintenance;
pub mod preferences;
pub mod transform;
