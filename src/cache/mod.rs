//! Cache components: the client-side mirror of remote form content.
//!
//! One component per entity kind, structurally identical peers:
//! [`SectionCache`] holds the sections of a form (order persisted on the
//! `form` row), [`QuestionCache`] the questions of a section (order persisted
//! on the `section` row). Each keeps the last known-good list of live
//! records, a per-parent order index, and an ephemeral current selection.
//!
//! Every mutating operation follows the same two-phase discipline: issue the
//! remote call first, then reconcile local state from the returned rows.
//! Local state never changes before the remote store has confirmed.

use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod error;
pub mod question;
pub mod section;

pub use error::SyncError;
pub use question::QuestionCache;
pub use section::SectionCache;

/// Decodes a remote row into a typed record.
fn decode<T: DeserializeOwned>(row: Value, entity: &'static str) -> Result<T, SyncError> {
    serde_json::from_value(row).map_err(|source| SyncError::Decode { entity, source })
}

/// Decodes a list-query result.
fn decode_rows<T: DeserializeOwned>(
    rows: Vec<Value>,
    entity: &'static str,
) -> Result<Vec<T>, SyncError> {
    rows.into_iter().map(|row| decode(row, entity)).collect()
}

/// Decodes the result of an operation that must affect exactly one row.
fn expect_single<T: DeserializeOwned>(
    rows: Vec<Value>,
    entity: &'static str,
) -> Result<T, SyncError> {
    match <[Value; 1]>::try_from(rows) {
        Ok([row]) => decode(row, entity),
        Err(rows) => Err(SyncError::RowCount {
            entity,
            count: rows.len(),
        }),
    }
}
