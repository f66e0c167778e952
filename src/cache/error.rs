//! Sync operation error types.

use thiserror::Error;

use crate::models::RecordId;
use crate::store::StoreError;

/// Errors that can occur during cache sync operations.
///
/// `Store` and `RowCount` are remote rejections: the operation had no local
/// effect. `OrderDesync` is a partial completion: the record was written
/// remotely, the parent's order was not, and the cache was left untouched.
/// Degraded states are not rolled back or retried here; a subsequent `list`
/// refresh resolves them.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote store declined or never answered the request.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A single-record operation matched zero or several rows.
    #[error("expected exactly one {entity} row, remote returned {count}")]
    RowCount { entity: &'static str, count: usize },

    /// A record was written remotely but its parent's order update failed.
    #[error("{entity} {id} was written remotely but the order for parent {parent_id} was not persisted")]
    OrderDesync {
        entity: &'static str,
        id: RecordId,
        parent_id: RecordId,
        #[source]
        source: Box<SyncError>,
    },

    /// A remote row did not decode into the expected record shape.
    #[error("malformed {entity} row")]
    Decode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
