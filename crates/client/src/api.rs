//! REST API client for the training service HTTP endpoints.
//!
//! Wraps health checks, task listing, per-task progress retrieval, task
//! deletion and training submission using [`reqwest`]. Every failure is
//! reduced to an [`ApiError`] whose `Display` is the single message shown
//! to users.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use trainsync_core::health::ServerHealth;
use trainsync_core::task::{ListQuery, Task, TaskList, TrainingMode};
use trainsync_core::training::{StartTrainingResponse, TrainingRequest};

/// Per-request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a single training service instance.
#[derive(Debug, Clone)]
pub struct TrainingApi {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

/// Errors from the training service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("Failed to fetch: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status. `message` is either the
    /// service's own error text or `"<code> <reason>"`.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        message: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot carry a path.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status code, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::InvalidUrl(_) => None,
        }
    }
}

/// Fields the service may use to carry a human-readable error.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
    message: Option<Value>,
    error: Option<Value>,
}

impl TrainingApi {
    /// Create a new API client for a training service.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base HTTP URL this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the service health record (`GET /health`).
    pub async fn health(&self) -> Result<ServerHealth, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["health"])?)
            .timeout(self.timeout)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List tasks (`GET /tasks?status=&limit=`).
    pub async fn list_tasks(&self, query: &ListQuery) -> Result<TaskList, ApiError> {
        let mut params: Vec<(&str, String)> = vec![("limit", query.limit.to_string())];
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }

        let response = self
            .client
            .get(self.endpoint(&["tasks"])?)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the full record of one task (`GET /progress/{task_id}`).
    pub async fn task_progress(&self, task_id: &str) -> Result<Task, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["progress", task_id])?)
            .timeout(self.timeout)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Delete a task (`DELETE /tasks/{task_id}`).
    pub async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoint(&["tasks", task_id])?)
            .timeout(self.timeout)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Submit a new training task (`POST /train/{mode}`).
    pub async fn start_training(
        &self,
        mode: TrainingMode,
        request: &TrainingRequest,
    ) -> Result<StartTrainingResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["train", mode.as_str()])?)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;

        let started: StartTrainingResponse = Self::parse_response(response).await?;
        tracing::info!(
            task_id = %started.task_id,
            mode = mode.as_str(),
            "Training task submitted",
        );
        Ok(started)
    }

    // ---- private helpers ----

    /// Base URL with `segments` appended, each percent-encoded, so a task
    /// id containing `/`, `?` or `#` stays one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let invalid = |reason: String| ApiError::InvalidUrl(format!("{}: {reason}", self.api_url));
        let mut url = reqwest::Url::parse(&self.api_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Api`] carrying the
    /// best available message on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message =
            extract_message(&body).unwrap_or_else(|| status_line(status.as_u16(), status.canonical_reason()));
        tracing::debug!(status = status.as_u16(), %message, "Training service returned an error");

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a message out of an error body, trying `detail`, `message`, then
/// `error`. Only string values count.
fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    [parsed.detail, parsed.message, parsed.error]
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        })
}

/// `"<code> <reason>"`, e.g. `"503 Service Unavailable"`.
fn status_line(code: u16, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}
