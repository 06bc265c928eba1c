//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! allowlist.rs (compiled in)
//!     → AllowList, shared via Arc with both handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the service runs without a file
//! - Allow-lists are constants, never read from the file

pub mod allowlist;
pub mod loader;
pub mod schema;
pub mod secret;
pub mod validation;

pub use allowlist::AllowList;
pub use loader::{load_config, load_or_default, ConfigError};
pub use secret::SecretToken;
pub use schema::{
    ContactConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RateLimitConfig,
    SecurityConfig, TimeoutConfig, UpstreamConfig,
};
