//! Compiled-in allow-lists.
//!
//! These are not read from the configuration file. An [`AllowList`] is built
//! once at startup and shared behind an `Arc`; nothing mutates it afterwards.

/// The only base the tabular proxy will address.
pub const ALLOWED_BASE: &str = "applOjDjhH0RqLtBH";

/// Tables within [`ALLOWED_BASE`] that callers may reach.
pub const ALLOWED_TABLES: &[&str] = &[
    "tblMptC862PyL7Znw",
    "tblLpN4wceakfNFpq",
    "tblvB5OpG0b5mVix3",
];

/// Browser origins accepted by the tabular proxy. The first entry doubles as
/// the `Access-Control-Allow-Origin` fallback for unknown origins.
pub const ALLOWED_ORIGINS: &[&str] = &[
    "https://prioai.ca",
    "https://www.prioai.ca",
    "https://dashboard.prioai.ca",
    "http://localhost:8788",
    "http://localhost:3000",
    "http://127.0.0.1:8788",
    "http://127.0.0.1:3000",
];

/// The single origin the contact endpoint advertises.
pub const CONTACT_ORIGIN: &str = "https://prioai.ca";

/// Immutable allow-list snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    base: String,
    tables: Vec<String>,
    origins: Vec<String>,
}

impl AllowList {
    /// The allow-list baked into this build.
    pub fn embedded() -> Self {
        Self::new(ALLOWED_BASE, ALLOWED_TABLES, ALLOWED_ORIGINS)
    }

    /// Build an allow-list from explicit values.
    ///
    /// `origins` must not be empty: its first entry is the CORS fallback.
    pub fn new(base: &str, tables: &[&str], origins: &[&str]) -> Self {
        assert!(!origins.is_empty(), "allow-list needs at least one origin");
        Self {
            base: base.to_string(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
            origins: origins.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }

    pub fn has_origin(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    /// Origin echoed back when the caller's origin is not listed.
    pub fn fallback_origin(&self) -> &str {
        &self.origins[0]
    }
}
