//! Question cache: the questions of a section and their display order.
//!
//! Questions live in the `question` table; the user-defined display order is
//! an id array on the owning `section` row (`question_order`). Same shape as
//! the section component, one nesting level deeper.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;

use super::{decode_rows, expect_single, SyncError};
use crate::models::{Fields, NewQuestion, Question, RecordId, RecordState};
use crate::store::{Filter, RemoteStore};

const TABLE: &str = "question";
const PARENT_TABLE: &str = "section";
const ORDER_COLUMN: &str = "question_order";
const ENTITY: &str = "question";

/// Client-side cache of a section's questions, synced against the remote
/// store.
pub struct QuestionCache {
    store: Arc<dyn RemoteStore>,
    questions: Vec<Question>,
    current: Option<Question>,
    order: HashMap<RecordId, Vec<RecordId>>,
}

impl QuestionCache {
    /// Creates an empty cache backed by the given remote store.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            questions: Vec::new(),
            current: None,
            order: HashMap::new(),
        }
    }

    /// Clears the cached list, the order index, and the current selection.
    ///
    /// Used on navigation away from a section. Idempotent.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.current = None;
        self.order.clear();
    }

    /// The cached live questions, in list-query order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The most recently added or updated question, if any.
    pub fn current(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    /// The last persisted display order for a section, if known.
    pub fn order(&self, section_id: RecordId) -> Option<&[RecordId]> {
        self.order.get(&section_id).map(Vec::as_slice)
    }

    /// The full order index (section id → ordered question ids).
    pub fn order_index(&self) -> &HashMap<RecordId, Vec<RecordId>> {
        &self.order
    }

    /// Fetches the live questions of a section and replaces the cached list.
    ///
    /// On failure the cache keeps its previous contents.
    pub async fn list(&mut self, section_id: RecordId) -> Result<&[Question], SyncError> {
        let rows = self
            .store
            .select(
                TABLE,
                &[
                    Filter::eq("section_id", section_id),
                    Filter::neq("state", "Delete"),
                ],
            )
            .await?;

        self.questions = decode_rows(rows, ENTITY)?;
        Ok(&self.questions)
    }

    /// Creates a question remotely, appends it to the section's display
    /// order, and on full success adds it to the cache and selects it.
    ///
    /// A new question is never visible in the cache without also being in the
    /// order sequence. If the order update fails the question exists remotely
    /// but belongs to no order list; the error reports the orphaned id and
    /// nothing is cached.
    pub async fn add(&mut self, question: NewQuestion) -> Result<Question, SyncError> {
        let section_id = question.section_id;
        let payload = serde_json::to_value(&question)
            .map_err(|source| SyncError::Decode { entity: ENTITY, source })?;

        let rows = self.store.insert(TABLE, payload).await?;
        let created: Question = expect_single(rows, ENTITY)?;

        let mut order = self.order.get(&section_id).cloned().unwrap_or_default();
        order.push(created.id);
        self.persist_order(section_id, order).await.map_err(|source| {
            tracing::warn!(
                "Question {} created but order update for section {} failed",
                created.id,
                section_id
            );
            SyncError::OrderDesync {
                entity: ENTITY,
                id: created.id,
                parent_id: section_id,
                source: Box::new(source),
            }
        })?;

        tracing::debug!("Added question {} to section {}", created.id, section_id);
        self.questions.push(created.clone());
        self.current = Some(created.clone());
        Ok(created)
    }

    /// Updates a question's payload fields remotely and replaces the cached
    /// entry in place. Never reorders.
    pub async fn update(&mut self, id: RecordId, patch: Fields) -> Result<Question, SyncError> {
        let rows = self
            .store
            .update(TABLE, &[Filter::eq("id", id)], serde_json::Value::Object(patch))
            .await?;
        let updated: Question = expect_single(rows, ENTITY)?;

        if let Some(slot) = self.questions.iter_mut().find(|q| q.id == updated.id) {
            *slot = updated.clone();
        }
        self.current = Some(updated.clone());
        Ok(updated)
    }

    /// Soft-deletes a question and removes it from the section's display
    /// order and from the cache. The remote row is never destroyed.
    ///
    /// The recomputed order keeps every id that is not the deleted one. If
    /// the order update fails the row is already marked deleted remotely; the
    /// cache keeps showing it until the next `list` refresh.
    pub async fn delete(&mut self, id: RecordId) -> Result<(), SyncError> {
        let rows = self
            .store
            .update(
                TABLE,
                &[Filter::eq("id", id)],
                json!({ "state": RecordState::Delete }),
            )
            .await?;
        let deleted: Question = expect_single(rows, ENTITY)?;
        let section_id = deleted.section_id;

        let order: Vec<RecordId> = self
            .order
            .get(&section_id)
            .map(|ids| ids.iter().copied().filter(|&other| other != id).collect())
            .unwrap_or_default();

        self.persist_order(section_id, order).await.map_err(|source| {
            tracing::warn!(
                "Question {} deleted remotely but order update for section {} failed",
                id,
                section_id
            );
            SyncError::OrderDesync {
                entity: ENTITY,
                id,
                parent_id: section_id,
                source: Box::new(source),
            }
        })?;

        self.questions.retain(|q| q.id != id);
        if self.current.as_ref().is_some_and(|q| q.id == id) {
            self.current = None;
        }
        tracing::debug!("Deleted question {} from section {}", id, section_id);
        Ok(())
    }

    /// Soft-deletes every question matching the AND-combined equality filters
    /// and removes the affected ids from the display order of the first
    /// affected question's section.
    ///
    /// The order recompute is an explicit set-difference against all affected
    /// ids. The cached list is intentionally left alone; callers pair bulk
    /// deletes with a `list` refresh. All matches are assumed to share one
    /// section.
    pub async fn delete_by(&mut self, filters: Fields) -> Result<(), SyncError> {
        let filters: Vec<Filter> = filters
            .into_iter()
            .map(|(field, value)| Filter::Eq(field, value))
            .collect();

        let rows = self
            .store
            .update(TABLE, &filters, json!({ "state": RecordState::Delete }))
            .await?;
        let affected: Vec<Question> = decode_rows(rows, ENTITY)?;

        let Some(first) = affected.first() else {
            return Ok(());
        };
        let section_id = first.section_id;

        let affected_ids: HashSet<RecordId> = affected.iter().map(|q| q.id).collect();
        let order: Vec<RecordId> = self
            .order
            .get(&section_id)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| !affected_ids.contains(id))
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(
            "Bulk-deleted {} question(s) from section {}",
            affected.len(),
            section_id
        );
        self.persist_order(section_id, order).await
    }

    /// Persists a section's question order as an opaque id array on the
    /// section row, then replaces the order index entry for that section.
    ///
    /// On failure the index keeps its previous value.
    pub async fn persist_order(
        &mut self,
        section_id: RecordId,
        order: Vec<RecordId>,
    ) -> Result<(), SyncError> {
        self.store
            .update(
                PARENT_TABLE,
                &[Filter::eq("id", section_id)],
                json!({ ORDER_COLUMN: &order }),
            )
            .await?;

        self.order.insert(section_id, order);
        Ok(())
    }
}
