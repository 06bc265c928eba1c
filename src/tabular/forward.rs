//! Upstream request construction and execution.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use url::Url;

use crate::config::SecretToken;
use crate::error::ProxyError;
use crate::observability::metrics;
use crate::tabular::path::ValidatedPath;

/// Methods whose inbound body is forwarded.
pub fn carries_body(method: &Method) -> bool {
    [Method::POST, Method::PATCH, Method::PUT].contains(method)
}

/// Why an upstream URL could not be built.
#[derive(Debug, Error)]
pub enum UpstreamUrlError {
    #[error("invalid upstream base URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("upstream base URL cannot carry a path")]
    CannotBeABase,

    #[error("upstream path {0} left the allow-listed table")]
    Escaped(String),
}

/// `{base}/{path}` plus the forwarded query pairs.
///
/// Path segments are appended one by one and percent-encoded, so nothing in
/// them is read as a query, fragment or dot segment. The query is re-encoded
/// as `application/x-www-form-urlencoded`. No `?` is appended when there is
/// nothing to forward.
pub fn upstream_url(
    base: &str,
    path: &ValidatedPath,
    params: &[(String, String)],
) -> Result<Url, UpstreamUrlError> {
    let mut url = Url::parse(base.trim_end_matches('/'))?;
    let prefix = format!(
        "{}/{}/{}",
        url.path().trim_end_matches('/'),
        path.base(),
        path.table()
    );

    url.path_segments_mut()
        .map_err(|()| UpstreamUrlError::CannotBeABase)?
        .pop_if_empty()
        .extend(path.as_str().split('/'));

    let resolved = url.path();
    if resolved != prefix && !resolved.starts_with(&format!("{}/", prefix)) {
        return Err(UpstreamUrlError::Escaped(resolved.to_string()));
    }

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// A fully reconstructed upstream call.
pub struct ForwardSpec {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ForwardSpec {
    /// Only the bearer token and a JSON content type are sent; no caller
    /// header is forwarded.
    pub fn new(
        method: Method,
        url: Url,
        token: &SecretToken,
        body: Option<Bytes>,
    ) -> Result<Self, ProxyError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose())).map_err(|_| {
            tracing::error!("Upstream token contains characters not allowed in a header");
            ProxyError::Configuration
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }
}

impl fmt::Debug for ForwardSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardSpec")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("authorization", &"[redacted]")
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .finish()
    }
}

/// What came back from upstream, relayed verbatim.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Executes [`ForwardSpec`]s on a shared connection pool.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn send(&self, spec: ForwardSpec) -> Result<UpstreamResponse, ProxyError> {
        let started = Instant::now();
        tracing::debug!(spec = ?spec, "Forwarding to upstream");

        let mut request = self
            .client
            .request(spec.method, spec.url)
            .headers(spec.headers);
        if let Some(body) = spec.body {
            request = request.body(body);
        }

        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse { status, body })
        }
        .await;

        metrics::record_upstream("tabular", started, result.is_ok());
        result.map_err(|e| {
            tracing::error!(error = %e, timeout = e.is_timeout(), "Upstream request failed");
            ProxyError::Transport(Box::new(e))
        })
    }
}
