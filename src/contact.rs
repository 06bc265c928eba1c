//! Contact form relay.
//!
//! Parses the inbound JSON, re-serializes it and POSTs it to the webhook.
//! Unlike the tabular proxy, the upstream status is never passed through:
//! any non-2xx answer becomes a generic 500.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::Response;
use std::time::Instant;

use crate::config::ContactConfig;
use crate::error::ProxyError;
use crate::http::request::InboundRequest;
use crate::http::response::{self, SuccessBody};
use crate::observability::metrics;
use crate::security::cors::{contact_headers, contact_preflight_headers};

pub struct ContactRelay {
    client: reqwest::Client,
    webhook_url: String,
}

impl ContactRelay {
    pub fn new(config: &ContactConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            webhook_url: config.webhook_url.clone(),
        }
    }

    pub async fn relay(&self, inbound: InboundRequest) -> Response {
        let body = inbound.try_read_body().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Contact body unreadable, parsing as empty");
            Bytes::new()
        });
        let response = match self.send(&body).await {
            Ok(()) => response::json(StatusCode::OK, &SuccessBody { success: true }, contact_headers()),
            Err(e) => {
                tracing::warn!(error = ?e, "Contact relay failed");
                e.into_response_with(contact_headers())
            }
        };
        metrics::record_request("contact", response.status());
        response
    }

    async fn send(&self, body: &[u8]) -> Result<(), ProxyError> {
        let payload: serde_json::Value = serde_json::from_slice(body)?;

        let started = Instant::now();
        let result = self.client.post(&self.webhook_url).json(&payload).send().await;
        metrics::record_upstream("contact", started, result.is_ok());

        let upstream = result.map_err(ProxyError::WebhookTransport)?;
        if upstream.status().is_success() {
            Ok(())
        } else {
            Err(ProxyError::WebhookRejected(upstream.status()))
        }
    }

    /// Answers OPTIONS without looking at the origin.
    pub fn preflight() -> Response {
        metrics::record_request("contact", StatusCode::NO_CONTENT);
        response::preflight(contact_preflight_headers())
    }
}
