//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID for every inbound request
//! - Derive the client identity used for rate limiting
//! - Present the inbound request in a runtime-independent form
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is kept unread until a handler decides it needs it
//! - Body reads are bounded in size and time; both limits end the read
//!   instead of failing the request

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use std::time::Duration;
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Client key used when no address header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// UUID v4 request IDs for `tower_http::request_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID assigned by the ID layer, or `"unknown"` outside the router.
pub fn request_id(headers: &HeaderMap) -> &str {
    header_str(headers, X_REQUEST_ID.as_str()).unwrap_or("unknown")
}

/// Identify the client: `CF-Connecting-IP`, then the first hop of
/// `X-Forwarded-For`, then the literal `"unknown"`. Empty values fall through.
pub fn client_key(headers: &HeaderMap) -> String {
    if let Some(ip) = header_str(headers, CF_CONNECTING_IP).filter(|v| !v.is_empty()) {
        return ip.to_string();
    }

    header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Declared `Origin`, empty when missing or not valid UTF-8.
pub fn origin(headers: &HeaderMap) -> &str {
    header_str(headers, "origin").unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Size and time bounds for reading an inbound body.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_bytes: usize,
    pub read_timeout: Duration,
}

/// Why an inbound body could not be read.
#[derive(Debug, Error)]
pub enum BodyReadError {
    #[error("body read failed or exceeded the size limit: {0}")]
    Read(#[from] axum::Error),

    #[error("body not received within {0:?}")]
    TimedOut(Duration),
}

/// Host-independent view of an inbound request.
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    body: Body,
    limits: BodyLimits,
}

impl InboundRequest {
    pub fn from_request(request: Request<Body>, limits: BodyLimits) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            headers: parts.headers,
            query: parts.uri.query().map(str::to_string),
            body,
            limits,
        }
    }

    pub fn origin(&self) -> &str {
        origin(&self.headers)
    }

    pub fn client_key(&self) -> String {
        client_key(&self.headers)
    }

    /// First value of query parameter `name`, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Decoded query pairs, in order, excluding every pair named `skip`.
    pub fn query_pairs_except(&self, skip: &str) -> Vec<(String, String)> {
        let Some(query) = self.query.as_deref() else {
            return Vec::new();
        };
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key != skip)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Read the whole body within the size and time limits.
    pub async fn try_read_body(self) -> Result<Bytes, BodyReadError> {
        let BodyLimits {
            max_bytes,
            read_timeout,
        } = self.limits;
        match tokio::time::timeout(read_timeout, axum::body::to_bytes(self.body, max_bytes)).await {
            Ok(read) => Ok(read?),
            Err(_) => Err(BodyReadError::TimedOut(read_timeout)),
        }
    }

    /// Read the whole body. Any read failure counts as no body.
    pub async fn read_body(self) -> Option<Bytes> {
        match self.try_read_body().await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Inbound body unreadable, forwarding without body");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: BodyLimits = BodyLimits {
        max_bytes: 1024,
        read_timeout: Duration::from_secs(5),
    };

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_client_key_precedence() {
        let h = headers(&[
            ("cf-connecting-ip", "203.0.113.7"),
            ("x-forwarded-for", "198.51.100.1, 10.0.0.1"),
        ]);
        assert_eq!(client_key(&h), "203.0.113.7");

        let h = headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.1")]);
        assert_eq!(client_key(&h), "198.51.100.1");

        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_client_key_skips_empty_values() {
        let h = headers(&[("cf-connecting-ip", ""), ("x-forwarded-for", "192.0.2.4")]);
        assert_eq!(client_key(&h), "192.0.2.4");

        let h = headers(&[("x-forwarded-for", ",10.0.0.1")]);
        assert_eq!(client_key(&h), "unknown");
    }

    #[test]
    fn test_origin_defaults_to_empty() {
        assert_eq!(origin(&HeaderMap::new()), "");
        let h = headers(&[("origin", "https://prioai.ca")]);
        assert_eq!(origin(&h), "https://prioai.ca");
    }

    #[test]
    fn test_query_helpers() {
        let request = Request::builder()
            .uri("/api/airtable?path=app%2Ftbl&filterByFormula=%7BName%7D%3D%27x%27&path=again&view=Grid")
            .body(Body::empty())
            .unwrap();
        let inbound = InboundRequest::from_request(request, LIMITS);

        assert_eq!(inbound.query_param("path").as_deref(), Some("app/tbl"));
        assert_eq!(inbound.query_param("missing"), None);
        assert_eq!(
            inbound.query_pairs_except("path"),
            vec![
                ("filterByFormula".to_string(), "{Name}='x'".to_string()),
                ("view".to_string(), "Grid".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_body() {
        let request = Request::builder()
            .method(Method::POST)
            .body(Body::from("{\"fields\":{}}"))
            .unwrap();
        let inbound = InboundRequest::from_request(request, LIMITS);
        assert_eq!(inbound.read_body().await.unwrap(), "{\"fields\":{}}");

        let empty = InboundRequest::from_request(
            Request::builder().method(Method::POST).body(Body::empty()).unwrap(),
            LIMITS,
        );
        assert!(empty.read_body().await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_body_counts_as_missing() {
        let request = Request::builder()
            .method(Method::PATCH)
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();
        let limits = BodyLimits {
            max_bytes: 16,
            ..LIMITS
        };
        let inbound = InboundRequest::from_request(request, limits);
        assert!(inbound.read_body().await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_body_is_a_read_error() {
        let request = Request::builder()
            .method(Method::POST)
            .body(Body::from(vec![b'{'; 64]))
            .unwrap();
        let limits = BodyLimits {
            max_bytes: 16,
            ..LIMITS
        };
        let err = InboundRequest::from_request(request, limits)
            .try_read_body()
            .await
            .unwrap_err();
        assert!(matches!(err, BodyReadError::Read(_)));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let mut maker = MakeRequestUuidV4;
        let req = Request::new(());
        let a = maker.make_request_id(&req).unwrap();
        let b = maker.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
