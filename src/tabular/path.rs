//! Validation of the `path` query parameter.
//!
//! A path looks like `base/table[/record...]`. The base and table are checked
//! against the allow-lists. Record ids and anything after them go upstream as
//! opaque segments, so none of them may be a dot segment or carry a query or
//! fragment delimiter that would move the request off `base/table`.

use std::sync::Arc;
use thiserror::Error;

use crate::config::AllowList;

/// Why a path was refused. `Display` is the reason sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Missing path parameter")]
    Missing,

    #[error("Invalid path format")]
    InvalidFormat,

    #[error("Invalid base ID")]
    InvalidBase,

    #[error("Invalid table ID")]
    InvalidTable,
}

/// A path that passed [`PathValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    raw: String,
}

impl ValidatedPath {
    /// The path exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn base(&self) -> &str {
        self.segment(0)
    }

    pub fn table(&self) -> &str {
        self.segment(1)
    }

    fn segment(&self, index: usize) -> &str {
        self.raw.split('/').nth(index).unwrap_or_default()
    }
}

pub type ValidationResult = Result<ValidatedPath, PathError>;

/// Checks paths against the base and table allow-lists.
#[derive(Debug, Clone)]
pub struct PathValidator {
    allow_list: Arc<AllowList>,
}

impl PathValidator {
    pub fn new(allow_list: Arc<AllowList>) -> Self {
        Self { allow_list }
    }

    pub fn validate(&self, path: Option<&str>) -> ValidationResult {
        let path = match path {
            Some(p) if !p.is_empty() => p,
            _ => return Err(PathError::Missing),
        };

        let mut segments = path.split('/');
        let (Some(base), Some(table)) = (segments.next(), segments.next()) else {
            return Err(PathError::InvalidFormat);
        };

        if base != self.allow_list.base() {
            return Err(PathError::InvalidBase);
        }
        if !self.allow_list.has_table(table) {
            return Err(PathError::InvalidTable);
        }
        if segments.any(escapes_table) {
            return Err(PathError::InvalidFormat);
        }

        Ok(ValidatedPath {
            raw: path.to_string(),
        })
    }
}

/// A trailing segment that a URL parser would resolve or split off.
fn escapes_table(segment: &str) -> bool {
    if segment.contains(['?', '#', '\\']) {
        return true;
    }
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}
