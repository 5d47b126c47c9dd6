//! The relay handler.
//!
//! Per request:
//! ```text
//! Received
//!     → OPTIONS            → Preflight (204)
//!     → body parse failure → ParseError (400)
//!     → transform
//!         → no API key     → ConfigError (500)
//!         → upstream error → UpstreamError (upstream status / fallback)
//!         → upstream 2xx   → Streaming (bytes relayed as-is)
//! ```
//! The resolved `Access-Control-Allow-Origin` is attached on every path.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        FromRequest, State,
    },
    http::{header, HeaderName, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
};

use crate::http::cors::preflight_response;
use crate::http::error::RelayError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::payload::InboundPayload;

const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";
const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Entry point invoked once per inbound request on the relay path.
pub async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let allow_origin = state.cors.resolve(request.headers());
    let method = request.method().clone();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        allow_origin = ?allow_origin,
        "Relay request received"
    );

    let (mut response, outcome) = if method == Method::OPTIONS {
        (preflight_response(), "preflight")
    } else {
        match relay(&state, request).await {
            Ok(response) => {
                tracing::info!(
                    request_id = %request_id,
                    status = %response.status(),
                    "Streaming upstream response"
                );
                (response, "streaming")
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    kind = e.kind(),
                    status = %e.status(),
                    "Relay request failed"
                );
                let kind = e.kind();
                (e.into_response(), kind)
            }
        }
    };

    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    metrics::record_request(outcome, response.status().as_u16(), start_time);
    response
}

async fn relay(state: &AppState, request: Request<Body>) -> Result<Response, RelayError> {
    if request.method() != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let body = Bytes::from_request(request, state)
        .await
        .map_err(body_rejection)?;

    let payload = InboundPayload::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejecting request body");
        RelayError::InvalidJson
    })?;
    let input = payload.to_upstream_input();

    let api_key = state.api_key.as_ref().ok_or(RelayError::MissingApiKey)?;

    let upstream = state.upstream.send(api_key, input).await?;
    Ok(stream_response(upstream))
}

/// Only an exceeded `DefaultBodyLimit` is a 413; anything else is a broken body.
fn body_rejection(rejection: BytesRejection) -> RelayError {
    match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            RelayError::PayloadTooLarge
        }
        other => {
            tracing::debug!(error = %other, "Failed to read request body");
            RelayError::BodyRead
        }
    }
}

/// Wrap the live upstream body without reading it.
fn stream_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut response = Body::from_stream(upstream.bytes_stream()).into_response();
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, RelayConfig};
    use axum::body::to_bytes;
    use crate::http::HttpServer;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router(config: RelayConfig) -> axum::Router {
        HttpServer::new(config).unwrap().router()
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/ai/stream")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_preflight() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/ai/stream")
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();

        let response = router(RelayConfig::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        assert!(headers.contains_key("x-request-id"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let mut config = RelayConfig::default();
        config.api_key = ApiKey::new("sk-test");

        let response = router(config).oneshot(post("{oops")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
        assert_eq!(json_body(response).await, json!({ "error": "Invalid JSON" }));
    }

    #[tokio::test]
    async fn test_invalid_json_checked_before_key() {
        let response = router(RelayConfig::default()).oneshot(post("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let body = r#"{"messages":[{"role":"user","content":"hi"}]}"#;
        let response = router(RelayConfig::default()).oneshot(post(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Missing OPENAI_API_KEY" })
        );
    }

    #[tokio::test]
    async fn test_disallowed_origin_gets_null() {
        let mut config = RelayConfig::default();
        config.cors.allow_origins = vec!["https://other.example.com".into()];

        let response = router(config).oneshot(post("{")).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "null");
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/ai/stream")
            .body(Body::empty())
            .unwrap();

        let response = router(RelayConfig::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ALLOW], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let mut config = RelayConfig::default();
        config.limits.max_body_bytes = 16;

        let body = r#"{"messages":[{"role":"user","content":"way past the limit"}]}"#;
        let response = router(config).oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Request body too large" })
        );
    }

    #[tokio::test]
    async fn test_aborted_body_is_not_too_large() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"messages\":[")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ];
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/ai/stream")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();

        let response = router(RelayConfig::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to read request body" })
        );
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();

        let response = router(RelayConfig::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }
}
