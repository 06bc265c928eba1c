//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_proxy_requests_total` (counter): responses by endpoint and status
//! - `edge_proxy_rate_limited_total` (counter): requests refused with 429
//! - `edge_proxy_upstream_failures_total` (counter): transport failures by target
//! - `edge_proxy_upstream_duration_seconds` (histogram): upstream latency by target
//!
//! Without an installed recorder every call is a no-op, which is what the
//! tests rely on.

use axum::http::StatusCode;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(endpoint: &'static str, status: StatusCode) {
    counter!(
        "edge_proxy_requests_total",
        "endpoint" => endpoint,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

pub fn record_rate_limited() {
    counter!("edge_proxy_rate_limited_total").increment(1);
}

pub fn record_upstream(target: &'static str, started: Instant, ok: bool) {
    histogram!("edge_proxy_upstream_duration_seconds", "target" => target)
        .record(started.elapsed().as_secs_f64());
    if !ok {
        counter!("edge_proxy_upstream_failures_total", "target" => target).increment(1);
    }
}
