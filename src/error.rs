//! Request-terminating errors and their HTTP mapping.

use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use thiserror::Error;

use crate::http::response::json_error;
use crate::tabular::path::PathError;

/// Every way a proxied request can end early.
///
/// `Display` is what the caller sees. Underlying causes stay in the variant
/// fields and only ever reach the server log.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Server configuration error")]
    Configuration,

    #[error(transparent)]
    Validation(#[from] PathError),

    #[error("Origin not allowed")]
    OriginRejected,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Failed to fetch from upstream")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to send to webhook")]
    WebhookRejected(StatusCode),

    #[error("Failed to send to webhook")]
    WebhookTransport(#[source] reqwest::Error),

    /// The contact endpoint reports the parser message verbatim.
    #[error("{0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::OriginRejected => StatusCode::FORBIDDEN,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Configuration
            | ProxyError::Transport(_)
            | ProxyError::WebhookRejected(_)
            | ProxyError::WebhookTransport(_)
            | ProxyError::InvalidJson(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as `{"error": ...}` carrying the endpoint's CORS headers.
    pub fn into_response_with(self, cors: HeaderMap) -> Response {
        json_error(self.status(), &self.to_string(), cors)
    }
}
