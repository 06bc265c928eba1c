//! The tabular proxy request pipeline.

use axum::http::StatusCode;
use axum::response::Response;
use std::sync::Arc;

use crate::config::{AllowList, ProxyConfig, SecretToken};
use crate::error::ProxyError;
use crate::http::request::InboundRequest;
use crate::http::response;
use crate::observability::metrics;
use crate::security::cors::{is_preflight, CorsPolicy};
use crate::security::RateLimiter;
use crate::tabular::forward::{carries_body, upstream_url, ForwardSpec, Forwarder, UpstreamResponse};
use crate::tabular::path::PathValidator;

/// Query parameter selecting the upstream path. Never forwarded.
pub const PATH_PARAM: &str = "path";

/// Preflight, rate limit, origin, path, credential, forward; in that order.
pub struct TabularProxy {
    cors: CorsPolicy,
    limiter: RateLimiter,
    validator: PathValidator,
    forwarder: Forwarder,
    base_url: String,
    token: Option<SecretToken>,
}

impl TabularProxy {
    pub fn new(
        config: &ProxyConfig,
        allow_list: Arc<AllowList>,
        client: reqwest::Client,
        token: Option<SecretToken>,
    ) -> Self {
        Self {
            cors: CorsPolicy::new(allow_list.clone()),
            limiter: RateLimiter::from_config(&config.rate_limit),
            validator: PathValidator::new(allow_list),
            forwarder: Forwarder::new(client),
            base_url: config.upstream.base_url.clone(),
            token,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub async fn handle(&self, inbound: InboundRequest) -> Response {
        let origin = inbound.origin().to_string();
        let cors = self.cors.headers(&origin);

        if is_preflight(&inbound.method) {
            metrics::record_request("tabular", StatusCode::NO_CONTENT);
            return response::preflight(cors);
        }

        let response = match self.proxy(inbound, &origin).await {
            Ok(UpstreamResponse { status, body }) => response::json_bytes(status, body, cors),
            Err(e) => e.into_response_with(cors),
        };
        metrics::record_request("tabular", response.status());
        response
    }

    async fn proxy(
        &self,
        inbound: InboundRequest,
        origin: &str,
    ) -> Result<UpstreamResponse, ProxyError> {
        let client = inbound.client_key();
        if !self.limiter.check_and_record(&client) {
            tracing::warn!(client = %client, "Rate limit exceeded");
            return Err(ProxyError::RateLimited);
        }

        if !self.cors.is_origin_allowed(origin) {
            tracing::warn!(origin = %origin, client = %client, "Origin not allowed");
            return Err(ProxyError::OriginRejected);
        }

        let raw_path = inbound.query_param(PATH_PARAM);
        let path = self.validator.validate(raw_path.as_deref()).map_err(|e| {
            tracing::info!(path = ?raw_path, reason = %e, "Rejected path");
            e
        })?;

        let Some(token) = self.token.as_ref() else {
            tracing::error!("Upstream token is not configured");
            return Err(ProxyError::Configuration);
        };

        let params = inbound.query_pairs_except(PATH_PARAM);
        let url = upstream_url(&self.base_url, &path, &params).map_err(|e| {
            tracing::error!(
                error = %e,
                base = path.base(),
                table = path.table(),
                "Could not build upstream URL"
            );
            ProxyError::Transport(Box::new(e))
        })?;

        let method = inbound.method.clone();
        let body = if carries_body(&method) {
            inbound.read_body().await
        } else {
            None
        };

        tracing::debug!(base = path.base(), table = path.table(), client = %client, "Path accepted");
        let spec = ForwardSpec::new(method, url, token, body)?;
        self.forwarder.send(spec).await
    }
}
