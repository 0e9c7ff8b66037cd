//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output, filtered by `RUST_LOG` or the configured level
//! - optional JSON log files with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use satchel::logging::init_logging;
//! use satchel::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config)?;
//!
//! tracing::info!("Application started");
//! # Ok::<(), satchel::domain::SatchelError>(())
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export run
///
/// # Example
///
/// ```no_run
/// use satchel::log_run_start;
///
/// let run_id = uuid::Uuid::new_v4();
/// log_run_start!(run_id, 5, 4);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($run_id:expr, $forms:expr, $parallelism:expr) => {
        tracing::info!(
            run_id = %$run_id,
            forms = $forms,
            parallelism = $parallelism,
            "Starting export run"
        );
    };
}

/// Log the terminal outcome of one form's export
///
/// # Example
///
/// ```no_run
/// use satchel::log_form_outcome;
/// use satchel::core::export::FormOutcome;
/// use satchel::domain::FormId;
///
/// let form_id = FormId::new("household").unwrap();
/// log_form_outcome!(&form_id, &FormOutcome::Cancelled);
/// ```
#[macro_export]
macro_rules! log_form_outcome {
    ($form_id:expr, $outcome:expr) => {
        match $outcome {
            $crate::core::export::FormOutcome::Failed { kind, message } => tracing::warn!(
                form_id = %$form_id,
                error_type = %kind,
                message = %message,
                "Form export failed"
            ),
            outcome => tracing::info!(
                form_id = %$form_id,
                outcome = outcome.label(),
                "Form export finished"
            ),
        }
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use satchel::log_error_with_context;
/// use satchel::domain::SatchelError;
///
/// let error = SatchelError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
    ($error:expr, $context:expr, $($field:tt)+) => {
        tracing::error!(
            $($field)+,
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::core::export::FormOutcome;
    use crate::domain::{ErrorKind, FormId, SatchelError};

    #[test]
    fn test_macros_expand() {
        let form_id = FormId::new("household").unwrap();
        crate::log_run_start!(uuid::Uuid::new_v4(), 3, 2);
        crate::log_form_outcome!(&form_id, &FormOutcome::Cancelled);
        crate::log_form_outcome!(
            &form_id,
            &FormOutcome::Failed {
                kind: ErrorKind::Parse,
                message: "bad".to_string()
            }
        );
        crate::log_error_with_context!(&SatchelError::Cancelled, "run");
        crate::log_error_with_context!(&SatchelError::Cancelled, "run", form_id = %form_id);
    }
}
