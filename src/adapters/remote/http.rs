//! HTTP implementation of [`RemoteSource`]
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET /forms` - JSON array of [`RemoteForm`]
//! - `GET /forms/{id}/definition` - definition document
//! - `GET /forms/{id}/submissions` - JSON array of submissions

use super::{RemoteForm, RemoteSource};
use crate::config::{RemoteConfig, RetryConfig};
use crate::domain::ids::FormId;
use crate::domain::{Result, SatchelError, Submission, TransferError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Remote source backed by the collection server's REST API
///
/// # Example
///
/// ```no_run
/// use satchel::adapters::remote::{HttpRemoteSource, RemoteSource};
/// use satchel::config::RemoteConfig;
///
/// # async fn example() -> satchel::domain::Result<()> {
/// let remote = HttpRemoteSource::new(RemoteConfig::default())?;
/// for form in remote.list_forms().await? {
///     println!("{}", form.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct HttpRemoteSource {
    base_url: String,
    client: Client,
    config: RemoteConfig,
}

impl HttpRemoteSource {
    /// Build a client from remote configuration
    ///
    /// # Errors
    ///
    /// Returns `SatchelError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .build()
            .map_err(|e| SatchelError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.client.get(format!("{}{path}", self.base_url));
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                let password: &str = password.expose_secret().as_ref();
                request.basic_auth(username, Some(password))
            }
            _ => request,
        }
    }

    /// Retry an operation with exponential backoff while its error is retryable
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    let retryable = matches!(&e, SatchelError::Transfer(t) if t.is_retryable());
                    if !retryable || attempt >= retry.max_retries {
                        return Err(e);
                    }

                    let delay_ms = backoff_delay_ms(retry, attempt);
                    tracing::warn!(
                        attempt = attempt,
                        max_retries = retry.max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Retrying request after error"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, form_id: Option<&FormId>) -> Result<T> {
        self.retry_request(|| async {
            let resp = self.get(path).send().await.map_err(map_reqwest_error)?;
            let resp = check_status(resp, form_id).await?;
            resp.json::<T>().await.map_err(|e| {
                SatchelError::Transfer(TransferError::InvalidResponse(format!(
                    "Failed to decode response from {path}: {e}"
                )))
            })
        })
        .await
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn list_forms(&self) -> Result<Vec<RemoteForm>> {
        tracing::debug!(base_url = %self.base_url, "Listing remote forms");
        self.get_json("/forms", None).await
    }

    async fn fetch_definition(&self, form_id: &FormId) -> Result<Vec<u8>> {
        let path = format!("/forms/{form_id}/definition");
        self.retry_request(|| async {
            let resp = self.get(&path).send().await.map_err(map_reqwest_error)?;
            let resp = check_status(resp, Some(form_id)).await?;
            let bytes = resp.bytes().await.map_err(map_reqwest_error)?;
            Ok(bytes.to_vec())
        })
        .await
    }

    async fn fetch_submissions(&self, form_id: &FormId) -> Result<Vec<Submission>> {
        let path = format!("/forms/{form_id}/submissions");
        let submissions: Vec<Submission> = self.get_json(&path, Some(form_id)).await?;
        tracing::debug!(form_id = %form_id, count = submissions.len(), "Fetched submissions");
        Ok(submissions)
    }
}

fn backoff_delay_ms(retry: &RetryConfig, attempt: usize) -> u64 {
    let factor = retry.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
    let delay = (retry.initial_delay_ms as f64 * factor) as u64;
    delay.min(retry.max_delay_ms)
}

fn map_reqwest_error(e: reqwest::Error) -> SatchelError {
    let err = if e.is_timeout() {
        TransferError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() {
        TransferError::ConnectionFailed(e.to_string())
    } else {
        TransferError::InvalidResponse(e.to_string())
    };
    SatchelError::Transfer(err)
}

async fn check_status(resp: Response, form_id: Option<&FormId>) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let err = match (status, form_id) {
        (StatusCode::NOT_FOUND, Some(id)) => TransferError::FormNotFound(id.to_string()),
        (s, _) if s.is_server_error() => TransferError::ServerError {
            status: s.as_u16(),
            message: body,
        },
        (s, _) => TransferError::ClientError {
            status: s.as_u16(),
            message: body,
        },
    };
    Err(SatchelError::Transfer(err))
}
