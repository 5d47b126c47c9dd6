//! Cross-origin access control.
//!
//! # Responsibilities
//! - Hold the origin allow-list loaded at startup
//! - Resolve `Access-Control-Allow-Origin` for each request
//! - Build the preflight (`OPTIONS`) response
//!
//! # Design Decisions
//! - No `Origin` header resolves to `*` (non-browser callers)
//! - An empty allow-list reflects any origin (development mode)
//! - Origins outside a non-empty allow-list get the literal `null`

use std::collections::HashSet;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";
pub const MAX_AGE_SECS: &str = "86400";

/// Set of origins permitted to receive their own origin back.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    origins: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins
                .into_iter()
                .map(Into::into)
                .filter(|o: &String| !o.is_empty())
                .collect(),
        }
    }

    /// Permissive mode: every origin is reflected.
    pub fn is_permissive(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    /// Compute the `Access-Control-Allow-Origin` value for a request.
    pub fn resolve(&self, headers: &HeaderMap) -> HeaderValue {
        let Some(origin) = headers.get(header::ORIGIN) else {
            return HeaderValue::from_static("*");
        };

        if self.is_permissive() {
            return origin.clone();
        }

        match origin.to_str() {
            Ok(value) if self.contains(value) => origin.clone(),
            _ => HeaderValue::from_static("null"),
        }
    }
}

/// Split a comma-separated origin list, trimming entries and dropping empties.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// 204 preflight response. The caller attaches the allow-origin header.
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
    response
}
