//! Tabular-data API proxy.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → handler.rs (preflight, rate limit, origin check)
//!     → path.rs (base/table allow-list)
//!     → forward.rs (URL + headers + body, upstream call)
//!     → upstream status and body relayed verbatim
//! ```

pub mod forward;
pub mod handler;
pub mod path;

pub use handler::TabularProxy;
pub use path::{PathError, PathValidator, ValidatedPath};
