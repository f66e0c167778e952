//! Formsync Core Library
//!
//! Client-side cache and sync core for ordered, soft-deletable form content
//! (forms → sections → questions) mirroring a remote store.
//!
//! Each entity kind gets a cache component ([`SectionCache`],
//! [`QuestionCache`]) holding the last known-good list of live records and a
//! per-parent display-order index. Every mutating operation writes to the
//! remote store first and reconciles local state only from the confirmed
//! result; on failure, local state is left untouched. Records are never
//! destroyed remotely: deletion flips their state to `Delete` and drops them
//! from the cache and the order.
//!
//! # Concurrency
//!
//! Operations suspend only while awaiting the remote store and are not
//! serialized against each other across component instances. Two concurrent
//! adds on the same parent can each read the order index before the other's
//! append is visible, losing one order update. Callers that need correctness
//! under concurrency must keep at most one in-flight order-affecting mutation
//! per parent.

pub mod cache;
pub mod config;
pub mod models;
pub mod store;

pub use cache::{QuestionCache, SectionCache, SyncError};
pub use config::{ConfigError, RemoteConfig};
pub use models::{Fields, NewQuestion, NewSection, Question, RecordId, RecordState, Section};
pub use store::{memory::MemoryStore, rest::RestStore, Filter, RemoteStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
