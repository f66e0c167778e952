use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Fields, RecordId, RecordState};

/// A question belonging to a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: RecordId,
    pub section_id: RecordId,
    #[serde(default)]
    pub state: RecordState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Insert payload for a new question. The remote store assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewQuestion {
    pub section_id: RecordId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NewQuestion {
    pub fn new(section_id: RecordId) -> Self {
        Self {
            section_id,
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}
