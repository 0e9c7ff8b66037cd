//! Error context extension trait
//!
//! Provides `.context()` and `.with_context()` on any `Result` whose error
//! converts into [`SatchelError`], so library code can attach context
//! without switching to `anyhow`.
//!
//! ```rust
//! use satchel::domain::Result;
//! use satchel::domain::context::ResultExt;
//!
//! fn read_definition(path: &str) -> Result<Vec<u8>> {
//!     std::fs::read(path).with_context(|| format!("Failed to read form definition {path}"))
//! }
//! ```

use crate::domain::errors::SatchelError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (evaluated only on error)
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SatchelError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f().to_string()))
    }
}

/// Prefix the message while keeping the variant, so report classification survives.
fn wrap(error: SatchelError, context: String) -> SatchelError {
    match error {
        SatchelError::Configuration(msg) => SatchelError::Configuration(format!("{context}: {msg}")),
        SatchelError::Parse(msg) => SatchelError::Parse(format!("{context}: {msg}")),
        SatchelError::Io(msg) => SatchelError::Io(format!("{context}: {msg}")),
        SatchelError::Preferences(msg) => SatchelError::Preferences(format!("{context}: {msg}")),
        SatchelError::Serialization(msg) => {
            SatchelError::Serialization(format!("{context}: {msg}"))
        }
        SatchelError::Cancelled => SatchelError::Cancelled,
        other => SatchelError::Other(format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ErrorKind, TransferError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_context_keeps_parse_kind() {
        let result: Result<()> = Err(SatchelError::Parse("missing id".to_string()));
        let err = result.context("forms/a/form.json").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("forms/a/form.json"));
        assert!(err.to_string().contains("missing id"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let with_context = result.with_context(|| {
            called_clone.store(true, Ordering::SeqCst);
            "Expensive context"
        });

        assert!(with_context.is_ok());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancelled_is_never_wrapped() {
        let result: Result<()> = Err(SatchelError::Cancelled);
        let err = result.context("exporting form a").unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_transfer_error_with_context() {
        let result: std::result::Result<(), TransferError> =
            Err(TransferError::Timeout("30s".to_string()));
        let err = result.context("Failed to fetch submissions").unwrap_err();
        assert!(err.to_string().contains("Failed to fetch submissions"));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_io_error_with_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let result: std::result::Result<(), std::io::Error> = Err(io_error);
        let err = result.context("Failed to read 'satchel.toml'").unwrap_err();
        assert!(matches!(err, SatchelError::Io(_)));
        assert!(err.to_string().contains("File not found"));
    }
}
