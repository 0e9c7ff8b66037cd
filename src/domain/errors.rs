//! Domain error types
//!
//! This module defines the error hierarchy for Satchel. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Satchel error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum SatchelError {
    /// Invalid export or application configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed form definition
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O or network failure while fetching or writing submissions
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Cooperative abort observed at a checkpoint
    #[error("Cancelled")]
    Cancelled,

    /// API misuse, e.g. resetting a token while a run is active
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Two form definitions share the same form id
    #[error("Duplicate form id: {0}")]
    DuplicateForm(String),

    /// Preferences store errors
    #[error("Preferences error: {0}")]
    Preferences(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl SatchelError {
    /// Classify this error for per-form reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            SatchelError::Parse(_) => ErrorKind::Parse,
            SatchelError::Configuration(_) | SatchelError::DuplicateForm(_) => {
                ErrorKind::Configuration
            }
            SatchelError::Transfer(_) | SatchelError::Io(_) => ErrorKind::Transfer,
            SatchelError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Other,
        }
    }

    /// Whether this error is the cooperative cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SatchelError::Cancelled)
    }
}

/// Report-level error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    Configuration,
    Transfer,
    Cancelled,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Transfer => "TransferError",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Other => "Error",
        };
        f.write_str(label)
    }
}

/// Transfer-specific errors
///
/// Errors that occur when talking to the remote collection server or when
/// reading/writing submission files. These errors don't expose HTTP client types.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failed to connect to the remote server
    #[error("Failed to connect to remote server: {0}")]
    ConnectionFailed(String),

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Form not known to the server
    #[error("Form not found: {0}")]
    FormNotFound(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Failed to read local submissions
    #[error("Failed to read submissions: {0}")]
    ReadFailed(String),

    /// Failed to write export output
    #[error("Failed to write export output: {0}")]
    WriteFailed(String),
}

impl TransferError {
    /// Whether retrying the request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::ConnectionFailed(_)
                | TransferError::Timeout(_)
                | TransferError::ServerError { .. }
        )
    }
}

impl From<std::io::Error> for SatchelError {
    fn from(err: std::io::Error) -> Self {
        SatchelError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SatchelError {
    fn from(err: serde_json::Error) -> Self {
        SatchelError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SatchelError {
    fn from(err: toml::de::Error) -> Self {
        SatchelError::Configuration(format!("TOML parse error: {err}"))
    }
}
