//! CORS header computation and origin checks.
//!
//! Two policies exist: the tabular proxy reflects allow-listed origins and
//! falls back to the first listed origin otherwise; the contact endpoint
//! always advertises one fixed origin.

use axum::http::{header, HeaderMap, HeaderValue, Method};
use std::sync::Arc;

use crate::config::allowlist::CONTACT_ORIGIN;
use crate::config::AllowList;

const MAX_AGE_SECS: &str = "86400";

/// CORS policy backed by the origin allow-list.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_list: Arc<AllowList>,
}

impl CorsPolicy {
    pub fn new(allow_list: Arc<AllowList>) -> Self {
        Self { allow_list }
    }

    /// Response headers for a request declaring `origin` (empty if absent).
    pub fn headers(&self, origin: &str) -> HeaderMap {
        let allowed = if self.allow_list.has_origin(origin) {
            origin
        } else {
            self.allow_list.fallback_origin()
        };

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(allowed)
            .unwrap_or_else(|_| HeaderValue::from_static("null"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PATCH, DELETE, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECS),
        );
        headers
    }

    /// Requests without an origin are direct API calls and are accepted.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        origin.is_empty() || self.allow_list.has_origin(origin)
    }
}

/// Browser preflight check.
pub fn is_preflight(method: &Method) -> bool {
    method == Method::OPTIONS
}

/// Fixed headers attached to every contact endpoint response.
pub fn contact_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CONTACT_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

/// Contact headers plus the preflight cache lifetime.
pub fn contact_preflight_headers() -> HeaderMap {
    let mut headers = contact_headers();
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
    headers
}
