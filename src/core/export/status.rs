//! Status notification boundary
//!
//! Jobs publish per-form progress through a [`StatusSink`]. Notifications are
//! fire-and-forget: a sink must return promptly and never fails the job.

use crate::domain::ids::FormId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One entry of a form's status history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub at: DateTime<Utc>,
    pub message: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, is_error: bool) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
            is_error,
        }
    }
}

/// Receiver of per-form status updates
pub trait StatusSink: Send + Sync {
    fn notify(&self, form_id: &FormId, message: &str, is_error: bool);
}

/// Sink that writes every update to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn notify(&self, form_id: &FormId, message: &str, is_error: bool) {
        if is_error {
            tracing::warn!(form_id = %form_id, status = %message, "Form status");
        } else {
            tracing::info!(form_id = %form_id, status = %message, "Form status");
        }
    }
}

/// Sink that forwards every update to several sinks in order
#[derive(Default, Clone)]
pub struct FanoutStatusSink {
    sinks: Vec<Arc<dyn StatusSink>>,
}

impl FanoutStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl StatusSink for FanoutStatusSink {
    fn notify(&self, form_id: &FormId, message: &str, is_error: bool) {
        for sink in &self.sinks {
            sink.notify(form_id, message, is_error);
        }
    }
}
