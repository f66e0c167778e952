//! Record identity and lifecycle state shared by all synced entities.

use serde::{Deserialize, Serialize};

/// Row identifier assigned by the remote store (serial column).
pub type RecordId = i64;

/// Opaque payload fields of a record: everything the core does not interpret.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Lifecycle state of a record.
///
/// Only `Delete` is interpreted (it marks a soft-deleted row). Every other
/// value is carried through unchanged, so backends are free to use whatever
/// workflow states they like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    Delete,
    #[serde(untagged)]
    Other(String),
}

impl RecordState {
    /// Conventional initial state for new rows.
    pub fn active() -> Self {
        RecordState::Other("Active".to_string())
    }

    /// Whether this record has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, RecordState::Delete)
    }
}

impl Default for RecordState {
    fn default() -> Self {
        Self::active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_serializes_as_plain_string() {
        let json = serde_json::to_string(&RecordState::Delete).unwrap();
        assert_eq!(json, "\"Delete\"");

        let parsed: RecordState = serde_json::from_str("\"Delete\"").unwrap();
        assert!(parsed.is_deleted());
    }

    #[test]
    fn test_other_states_pass_through() {
        let parsed: RecordState = serde_json::from_str("\"Review\"").unwrap();
        assert_eq!(parsed, RecordState::Other("Review".to_string()));
        assert!(!parsed.is_deleted());

        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, "\"Review\"");
    }

    #[test]
    fn test_default_is_active() {
        let state = RecordState::default();
        assert!(!state.is_deleted());
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"Active\"");
    }
}
