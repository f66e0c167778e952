//! Remote store boundary.
//!
//! The cache components talk to the persistent backend through the
//! [`RemoteStore`] trait: filterable select, insert, and update over JSON
//! rows. The trait is object-safe so every component can share one
//! `Arc<dyn RemoteStore>`.
//!
//! ## Implementations
//!
//! - [`rest::RestStore`]: production HTTP backend (PostgREST dialect)
//! - [`memory::MemoryStore`]: in-memory backend for tests and offline use

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod rest;

/// Errors reported by a remote store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response (connection refused, timeout).
    #[error("remote request failed: {0}")]
    Transport(String),

    /// The store answered and declined the operation.
    #[error("remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store answered with something the client could not decode.
    #[error("malformed response from remote store: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// A single row predicate. Filters on one request combine with logical AND.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value.
    Eq(String, Value),
    /// Field does not equal value.
    Neq(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Neq(field.into(), value.into())
    }

    /// Whether a JSON row satisfies this predicate.
    ///
    /// A missing field never equals anything, so it fails `Eq` and passes
    /// `Neq`.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(field, value) => row.get(field) == Some(value),
            Filter::Neq(field, value) => row.get(field) != Some(value),
        }
    }
}

/// Narrow contract of the persistent backend.
///
/// Rows are JSON objects; typed decoding is the caller's concern. Writes
/// return the created/affected rows so callers can reconcile local state
/// against what was actually committed.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows of `table` matching all `filters`.
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError>;

    /// Insert one row, returning the stored row (with assigned columns).
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError>;

    /// Patch all rows matching `filters`, returning the affected rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_matches_value() {
        let row = json!({ "section_id": 3, "difficulty": "easy" });
        assert!(Filter::eq("section_id", 3).matches(&row));
        assert!(!Filter::eq("section_id", 4).matches(&row));
        assert!(Filter::eq("difficulty", "easy").matches(&row));
    }

    #[test]
    fn test_neq_matches_value() {
        let row = json!({ "state": "Active" });
        assert!(Filter::neq("state", "Delete").matches(&row));
        assert!(!Filter::neq("state", "Active").matches(&row));
    }

    #[test]
    fn test_missing_field_fails_eq_passes_neq() {
        let row = json!({ "id": 1 });
        assert!(!Filter::eq("state", "Delete").matches(&row));
        assert!(Filter::neq("state", "Delete").matches(&row));
    }
}
