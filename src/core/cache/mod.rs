//! Form definition cache
//!
//! - [`digest`] - SHA-256 content hashing used for change detection
//! - [`store`] - durable cache entry storage
//! - [`definitions`] - the cache itself

pub mod definitions;
pub mod digest;
pub mod store;

pub use definitions::{DefinitionCache, FormParser, JsonFormParser, ScanResult, DEFINITION_FILE_NAME};
pub use digest::Digest;
pub use store::{CacheEntry, CacheStore, JsonFileCacheStore, MemoryCacheStore};
