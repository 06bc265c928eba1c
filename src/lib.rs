//! Edge proxy library: a tabular-data API proxy and a contact form relay.

pub mod config;
pub mod contact;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod tabular;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
