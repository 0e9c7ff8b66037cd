//! Result type alias for Satchel

use super::errors::SatchelError;

/// Result type alias for Satchel operations
///
/// # Examples
///
/// ```
/// use satchel::domain::result::Result;
/// use satchel::domain::errors::SatchelError;
///
/// fn failing_function() -> Result<()> {
///     Err(SatchelError::Configuration("missing output directory".to_string()))
/// }
///
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, SatchelError>;
