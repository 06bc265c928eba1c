//! Response construction.
//!
//! Every response the proxy produces is JSON (or empty, for preflight) and
//! carries the CORS headers computed for its endpoint.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Error body: a single `error` field.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// Contact success body.
#[derive(Debug, Serialize)]
pub struct SuccessBody {
    pub success: bool,
}

/// 204 with no body.
pub fn preflight(cors: HeaderMap) -> Response {
    (StatusCode::NO_CONTENT, cors).into_response()
}

/// Raw bytes labelled as JSON, whatever they contain.
pub fn json_bytes(status: StatusCode, body: Bytes, cors: HeaderMap) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.extend(cors);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Serialize `value` as the response body.
pub fn json<T: Serialize>(status: StatusCode, value: &T, cors: HeaderMap) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => json_bytes(status, Bytes::from(body), cors),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            json_bytes(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(b"{\"error\":\"Internal error\"}"),
                cors,
            )
        }
    }
}

/// `{"error": message}` with the given status.
pub fn json_error(status: StatusCode, message: &str, cors: HeaderMap) -> Response {
    json(status, &ErrorBody { error: message }, cors)
}
