use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Fields, RecordId, RecordState};

/// A section of a form, as stored remotely.
///
/// The core only interprets the identity columns and the lifecycle state;
/// everything else (title, description, display options, ...) rides along in
/// `fields` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: RecordId,
    pub form_id: RecordId,
    #[serde(default)]
    pub state: RecordState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Insert payload for a new section. The remote store assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewSection {
    pub form_id: RecordId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NewSection {
    pub fn new(form_id: RecordId) -> Self {
        Self {
            form_id,
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}
