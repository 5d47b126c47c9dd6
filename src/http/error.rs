//! Relay error taxonomy and its JSON rendering.
//!
//! Every failure is terminal for its request and renders as
//! `{"error": ..., "detail"?: ...}` with a determinate status.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::http::cors::ALLOW_METHODS;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Request body is not a valid payload.
    #[error("Invalid JSON")]
    InvalidJson,

    /// Request body exceeded the configured limit.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Request body stream failed before it was complete.
    #[error("Failed to read request body")]
    BodyRead,

    /// Method other than POST/OPTIONS on the relay path.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Upstream credential is not configured.
    #[error("Missing OPENAI_API_KEY")]
    MissingApiKey,

    /// Upstream answered with a failure, or could not be reached.
    #[error("OpenAI upstream error")]
    Upstream { status: StatusCode, detail: String },
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidJson => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::BodyRead => StatusCode::BAD_REQUEST,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream { status, .. } => *status,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidJson => "invalid_json",
            RelayError::PayloadTooLarge => "payload_too_large",
            RelayError::BodyRead => "body_read",
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::MissingApiKey => "missing_api_key",
            RelayError::Upstream { .. } => "upstream_error",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            detail: match &self {
                RelayError::Upstream { detail, .. } => Some(detail.as_str()),
                _ => None,
            },
        };

        let mut response = (self.status(), Json(body)).into_response();
        if matches!(self, RelayError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOW_METHODS));
        }
        response
    }
}
