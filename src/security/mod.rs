//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming tabular request:
//!     → cors.rs (preflight short-circuit, response headers)
//!     → rate_limit.rs (per-client fixed window)
//!     → cors.rs (origin allow-list check)
//!     → Pass to path validation
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Preflight never touches the limiter
//! - No trust in client input

pub mod cors;
pub mod rate_limit;

pub use cors::CorsPolicy;
pub use rate_limit::RateLimiter;
