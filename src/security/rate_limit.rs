//! Per-client fixed-window rate limiting.
//!
//! Counters live in process memory only. Every instance keeps its own map
//! and a restart forgets it, so the effective limit scales with the number of
//! instances behind the load balancer.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Count of requests seen from one client in its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRecord {
    pub count: u64,
    pub window_start: Instant,
}

impl RateRecord {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }
}

/// Fixed-window limiter keyed by client identifier.
pub struct RateLimiter {
    records: DashMap<String, RateRecord>,
    max_requests: u64,
    window: Duration,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            records: DashMap::new(),
            max_requests,
            window,
            enabled: true,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(config.max_requests, config.window())
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a request from `key` and report whether it is admitted.
    pub fn check_and_record(&self, key: &str) -> bool {
        self.check_and_record_at(key, Instant::now())
    }

    /// Same as [`check_and_record`](Self::check_and_record) with an explicit clock.
    ///
    /// The entry guard holds the shard lock for the whole read-modify-write,
    /// so concurrent requests from one key never lose an increment.
    pub fn check_and_record_at(&self, key: &str, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        let mut record = self
            .records
            .entry(key.to_string())
            .or_insert_with(|| RateRecord {
                count: 0,
                window_start: now,
            });

        if record.count == 0 || now.saturating_duration_since(record.window_start) > self.window {
            *record = RateRecord::fresh(now);
            return true;
        }

        record.count = record.count.saturating_add(1);
        let allowed = record.count <= self.max_requests;
        if !allowed {
            metrics::record_rate_limited();
        }
        allowed
    }

    /// Current record for `key`, if one exists.
    pub fn record(&self, key: &str) -> Option<RateRecord> {
        self.records.get(key).map(|r| *r)
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_request_after_limit() {
        let limiter = RateLimiter::new(3, Duration::from_millis(60_000));
        let start = Instant::now();

        for i in 0..3 {
            assert!(
                limiter.check_and_record_at("10.0.0.1", start + Duration::from_millis(i)),
                "request {} should be allowed",
                i + 1
            );
        }
        assert!(!limiter.check_and_record_at("10.0.0.1", start + Duration::from_millis(10)));
        assert!(!limiter.check_and_record_at("10.0.0.1", start + Duration::from_millis(20)));
    }

    #[test]
    fn test_window_reset_after_expiry() {
        let window = Duration::from_millis(60_000);
        let limiter = RateLimiter::new(2, window);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.check_and_record_at("client", start);
        }
        assert_eq!(limiter.record("client").unwrap().count, 5);

        let later = start + window + Duration::from_millis(1);
        assert!(limiter.check_and_record_at("client", later));

        let record = limiter.record("client").unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.window_start, later);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let window = Duration::from_millis(1000);
        let limiter = RateLimiter::new(1, window);
        let start = Instant::now();

        assert!(limiter.check_and_record_at("k", start));
        // Exactly one window later is still inside the window.
        assert!(!limiter.check_and_record_at("k", start + window));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_and_record_at("a", now));
        assert!(!limiter.check_and_record_at("a", now));
        assert!(limiter.check_and_record_at("b", now));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_empty_key_is_a_shared_bucket() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_and_record_at("", now));
        assert!(!limiter.check_and_record_at("", now));
    }

    #[test]
    fn test_disabled_limiter_admits_everything() {
        let config = RateLimitConfig {
            enabled: false,
            max_requests: 1,
            window_ms: 1000,
        };
        let limiter = RateLimiter::from_config(&config);
        for _ in 0..10 {
            assert!(limiter.check_and_record("k"));
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(u64::MAX, Duration::from_secs(3600)));
        let now = Instant::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        limiter.check_and_record_at("shared", now);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(limiter.record("shared").unwrap().count, 4000);
    }
}
