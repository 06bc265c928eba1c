//! Configuration validation.
//!
//! Serde handles the syntax; this module checks values that deserialize fine
//! but cannot work at runtime. All errors are collected, not just the first.

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: `{value}` is not a valid http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("upstream.token_env must not be empty")]
    EmptyTokenEnv,
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    check_url(&mut errors, "upstream.base_url", &config.upstream.base_url);
    check_url(&mut errors, "contact.webhook_url", &config.contact.webhook_url);

    if config.upstream.token_env.trim().is_empty() {
        errors.push(ValidationError::EmptyTokenEnv);
    }

    if config.rate_limit.enabled {
        check_positive(&mut errors, "rate_limit.max_requests", config.rate_limit.max_requests);
        check_positive(&mut errors, "rate_limit.window_ms", config.rate_limit.window_ms);
    }
    check_positive(&mut errors, "timeouts.connect_secs", config.timeouts.connect_secs);
    check_positive(&mut errors, "timeouts.upstream_secs", config.timeouts.upstream_secs);
    check_positive(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);
    check_positive(
        &mut errors,
        "security.max_body_size",
        config.security.max_body_size as u64,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.base_url = "ftp://example.com".into();
        config.rate_limit.max_requests = 0;
        config.upstream.token_env = " ".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero {
            field: "rate_limit.max_requests"
        }));
        assert!(errors.contains(&ValidationError::EmptyTokenEnv));
    }

    #[test]
    fn test_disabled_rate_limit_skips_limit_checks() {
        let mut config = ProxyConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }
}
