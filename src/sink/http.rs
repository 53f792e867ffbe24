//! Catalog REST API workflow store.
//!
//! Records a test-connection report on an automation workflow by sending a
//! JSON-Patch to `PATCH {base}/api/v1/automations/workflows/{id}`, retrying
//! transient failures with exponential back-off.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoffBuilder};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde_json::json;
use tracing::debug;

use super::{WorkflowRef, WorkflowStatus, WorkflowStore};
use crate::diagnostics::Report;
use crate::errors::{ConnectorError, Result};
use crate::secret::Secret;

const JSON_PATCH: &str = "application/json-patch+json";

/// Classify a transport error as transient (should retry) or permanent.
fn classify_error(err: reqwest::Error) -> backoff::Error<ConnectorError> {
    let msg = format!("catalog API request failed: {err}");
    if err.is_timeout() || err.is_connect() {
        backoff::Error::transient(ConnectorError::Workflow(msg))
    } else {
        backoff::Error::permanent(ConnectorError::Workflow(msg))
    }
}

/// Classify a non-success HTTP status.
fn classify_status(status: StatusCode, body: String) -> backoff::Error<ConnectorError> {
    let err = ConnectorError::Workflow(format!("catalog API returned HTTP {status}: {body}"));
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        backoff::Error::transient(err)
    } else {
        backoff::Error::permanent(err)
    }
}

/// [`WorkflowStore`] backed by the catalog server's automation-workflow API.
pub struct CatalogApiStore {
    client: Client,
    base_url: String,
    token: Option<Secret>,
    initial_interval: Duration,
    max_elapsed: Duration,
}

impl CatalogApiStore {
    /// Create a store.
    ///
    /// # Arguments
    /// * `base_url` – server root, e.g. `http://localhost:8585`.
    /// * `token`    – bearer token (JWT) for the ingestion bot, if auth is on.
    pub fn new(base_url: impl Into<String>, token: Option<Secret>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            initial_interval: Duration::from_millis(500),
            max_elapsed: Duration::from_secs(30),
        }
    }

    /// Shorten the retry schedule so tests against a mock server stay fast.
    #[cfg(test)]
    fn with_fast_retry(mut self) -> Self {
        self.initial_interval = Duration::from_millis(10);
        self.max_elapsed = Duration::from_secs(2);
        self
    }

    fn workflow_url(&self, workflow: &WorkflowRef) -> String {
        format!("{}/api/v1/automations/workflows/{}", self.base_url, workflow.id)
    }

    /// Send `patch` to `url`, retrying on transient failures
    /// (initial interval doubling up to 5 s, bounded total budget).
    async fn send_patch(&self, url: String, patch: serde_json::Value) -> Result<()> {
        let backoff_policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(Duration::from_secs(5))
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build();

        let body = serde_json::to_vec(&patch)?;
        let client = self.client.clone();
        let token = self.token.clone();

        retry(backoff_policy, move || {
            let client = client.clone();
            let url = url.clone();
            let body = body.clone();
            let token = token.clone();
            async move {
                let mut request = client
                    .patch(url.as_str())
                    .header(CONTENT_TYPE, JSON_PATCH)
                    .body(body);
                if let Some(token) = &token {
                    request = request.bearer_auth(token.expose());
                }

                let response = request.send().await.map_err(classify_error)?;
                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(classify_status(status, text));
                }
                Ok(())
            }
        })
        .await
    }
}

#[async_trait]
impl WorkflowStore for CatalogApiStore {
    async fn record_report(&self, workflow: &WorkflowRef, report: &Report) -> Result<()> {
        let response = serde_json::to_value(report)?;
        let patch = json!([
            { "op": "add", "path": "/response", "value": response },
            { "op": "add", "path": "/status", "value": WorkflowStatus::Successful },
        ]);
        let url = self.workflow_url(workflow);
        debug!(url = %url, "patching automation workflow");
        self.send_patch(url, patch).await
    }
}
