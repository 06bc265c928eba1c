//! Configuration schema definitions.
//!
//! Everything here is runtime-tunable from a TOML file. The allow-lists are
//! deliberately absent: they live in [`crate::config::allowlist`] and are
//! compiled into the binary.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-client rate limiting for the tabular proxy.
    pub rate_limit: RateLimitConfig,

    /// Tabular-data upstream and its credential source.
    pub upstream: UpstreamConfig,

    /// Contact form webhook.
    pub contact: ContactConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8788").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8788".to_string(),
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per client within one window.
    pub max_requests: u64,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 1000,
            window_ms: 60_000,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Tabular-data upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL the validated path is appended to.
    pub base_url: String,

    /// Name of the environment variable holding the bearer token.
    pub token_env: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.airtable.com/v0".to_string(),
            token_env: "AIRTABLE_TOKEN".to_string(),
        }
    }
}

/// Contact form relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Webhook receiving the re-serialized JSON body.
    pub webhook_url: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            webhook_url: "https://n8n.prioai.ca/webhook/feedback".to_string(),
        }
    }
}

/// Timeout configuration, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout.
    pub connect_secs: u64,

    /// Total upstream call timeout (request + response body).
    pub upstream_secs: u64,

    /// Deadline for receiving an inbound request body. A body still
    /// incomplete at the deadline is treated as unreadable.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 25,
            request_secs: 30,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "edge_proxy=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
