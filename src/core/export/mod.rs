//! Export orchestration
//!
//! - [`configuration`] - per-form export parameters and their layering
//! - [`registry`] - selection, overrides and status history of every known form
//! - [`cancellation`] - cooperative cancellation of a run
//! - [`status`] - status notification boundary
//! - [`driver`] - bounded parallel execution of one job per selected form
//! - [`summary`] - per-form outcomes of a run

pub mod cancellation;
pub mod configuration;
pub mod driver;
mod job;
pub mod registry;
pub mod status;
pub mod summary;

pub use cancellation::CancellationToken;
pub use configuration::{ConfigViolation, ExportConfiguration, ValidationReport};
pub use driver::{ExportDriver, DEFAULT_POOL_SIZE};
pub use registry::{FormEntry, FormRegistry, MergeSummary, SelectedForm};
pub use status::{FanoutStatusSink, StatusMessage, StatusSink, TracingStatusSink};
pub use summary::{ExportReport, FormOutcome, FormResult};
