//! Upstream completion API client.
//!
//! # Responsibilities
//! - Issue the streaming POST with the bearer credential
//! - Classify the outcome: streamable success vs. upstream failure
//! - Read upstream error text on a best-effort basis
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` shared by all requests
//! - No overall request timeout on the client: it would cut long streams
//! - No retries; the first failure is final
//! - Waiting for response headers is bounded; a timeout is a transport failure

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};

use crate::config::{ApiKey, UpstreamConfig};
use crate::http::error::RelayError;
use crate::relay::payload::{InputItem, UpstreamRequest};

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    config: Arc<UpstreamConfig>,
    request_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
            request_timeout,
        })
    }

    /// Send the streaming request and return the live response on success.
    ///
    /// The returned response's body has not been read; callers relay it.
    pub async fn send(
        &self,
        api_key: &ApiKey,
        input: Vec<InputItem>,
    ) -> Result<reqwest::Response, RelayError> {
        let body = UpstreamRequest::new(&self.config, input);

        let send = self
            .client
            .post(&self.config.url)
            .bearer_auth(api_key.expose())
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send();

        let response = match tokio::time::timeout(self.request_timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Upstream request failed");
                return Err(self.transport_failure());
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.request_timeout.as_secs(),
                    "Upstream did not respond in time"
                );
                return Err(self.transport_failure());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = tokio::time::timeout(self.request_timeout, read_error_detail(response))
                .await
                .unwrap_or_default();
            tracing::warn!(status = %status, detail_len = detail.len(), "Upstream returned error");
            return Err(RelayError::Upstream {
                status,
                detail,
            });
        }

        Ok(response)
    }

    /// No upstream status to mirror: fallback status, empty detail.
    fn transport_failure(&self) -> RelayError {
        RelayError::Upstream {
            status: StatusCode::from_u16(self.config.fallback_status)
                .unwrap_or(StatusCode::BAD_GATEWAY),
            detail: String::new(),
        }
    }
}

/// Read the upstream error body; a failed read yields an empty string.
pub async fn read_error_detail(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "Could not read upstream error body");
            String::new()
        }
    }
}
