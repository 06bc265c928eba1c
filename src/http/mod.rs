//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (client identity, InboundRequest)
//!     → tabular / contact handler
//!     → response.rs (JSON body, CORS headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{BodyLimits, InboundRequest, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
