//! Domain models and types for Satchel.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`FormId`])
//! - **Domain models** ([`FormDefinition`], [`Submission`])
//! - **Error types** ([`SatchelError`], [`TransferError`], [`ErrorKind`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SatchelError>`]:
//!
//! ```rust
//! use satchel::domain::{FormId, Result, SatchelError};
//!
//! fn parse_id(raw: &str) -> Result<FormId> {
//!     FormId::new(raw).map_err(SatchelError::Configuration)
//! }
//!
//! assert!(parse_id("").is_err());
//! ```

pub mod context;
pub mod errors;
pub mod form;
pub mod ids;
pub mod result;
pub mod submission;

pub use errors::{ErrorKind, SatchelError, TransferError};
pub use form::{FieldKind, FormDefinition, FormField};
pub use ids::FormId;
pub use result::Result;
pub use submission::Submission;
