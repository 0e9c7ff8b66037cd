//! Remote collection server integration
//!
//! [`RemoteSource`] abstracts the server that forms and submissions are pulled
//! from. [`HttpRemoteSource`] speaks the server's JSON REST API; tests use
//! in-memory fakes.

pub mod http;

pub use http::HttpRemoteSource;

use crate::domain::ids::FormId;
use crate::domain::{Result, Submission};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Summary of a form published by the remote server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteForm {
    pub id: FormId,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
}

/// Source of form definitions and submissions
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Every form the server publishes
    async fn list_forms(&self) -> Result<Vec<RemoteForm>>;

    /// Raw definition document of one form
    async fn fetch_definition(&self, form_id: &FormId) -> Result<Vec<u8>>;

    /// Every submission of one form
    async fn fetch_submissions(&self, form_id: &FormId) -> Result<Vec<Submission>>;
}
