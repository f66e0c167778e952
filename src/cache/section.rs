//! Section cache: the sections of a form and their display order.
//!
//! Sections live in the `section` table; the user-defined display order is an
//! id array on the owning `form` row (`section_order`). The form itself is
//! external to this core, known only by id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;

use super::{decode_rows, expect_single, SyncError};
use crate::models::{Fields, NewSection, RecordId, RecordState, Section};
use crate::store::{Filter, RemoteStore};

const TABLE: &str = "section";
const PARENT_TABLE: &str = "form";
const ORDER_COLUMN: &str = "section_order";
const ENTITY: &str = "section";

/// Client-side cache of a form's sections, synced against the remote store.
pub struct SectionCache {
    store: Arc<dyn RemoteStore>,
    sections: Vec<Section>,
    current: Option<Section>,
    order: HashMap<RecordId, Vec<RecordId>>,
}

impl SectionCache {
    /// Creates an empty cache backed by the given remote store.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            sections: Vec::new(),
            current: None,
            order: HashMap::new(),
        }
    }

    /// Clears the cached list, the order index, and the current selection.
    ///
    /// Used on navigation away from a form. Idempotent.
    pub fn reset(&mut self) {
        self.sections.clear();
        self.current = None;
        self.order.clear();
    }

    /// The cached live sections, in list-query order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The most recently added or updated section, if any.
    pub fn current(&self) -> Option<&Section> {
        self.current.as_ref()
    }

    /// The last persisted display order for a form, if known.
    pub fn order(&self, form_id: RecordId) -> Option<&[RecordId]> {
        self.order.get(&form_id).map(Vec::as_slice)
    }

    /// The full order index (form id → ordered section ids).
    pub fn order_index(&self) -> &HashMap<RecordId, Vec<RecordId>> {
        &self.order
    }

    /// Fetches the live sections of a form and replaces the cached list.
    ///
    /// On failure the cache keeps its previous contents: stale-but-valid data
    /// is preferred to no data.
    pub async fn list(&mut self, form_id: RecordId) -> Result<&[Section], SyncError> {
        let rows = self
            .store
            .select(
                TABLE,
                &[
                    Filter::eq("form_id", form_id),
                    Filter::neq("state", "Delete"),
                ],
            )
            .await?;

        self.sections = decode_rows(rows, ENTITY)?;
        Ok(&self.sections)
    }

    /// Creates a section remotely, appends it to the form's display order,
    /// and on full success adds it to the cache and selects it.
    ///
    /// If the order update fails the section exists remotely but belongs to
    /// no order list; the error reports the orphaned id and nothing is cached.
    pub async fn add(&mut self, section: NewSection) -> Result<Section, SyncError> {
        let form_id = section.form_id;
        let payload = serde_json::to_value(&section)
            .map_err(|source| SyncError::Decode { entity: ENTITY, source })?;

        let rows = self.store.insert(TABLE, payload).await?;
        let created: Section = expect_single(rows, ENTITY)?;

        let mut order = self.order.get(&form_id).cloned().unwrap_or_default();
        order.push(created.id);
        self.persist_order(form_id, order).await.map_err(|source| {
            tracing::warn!(
                "Section {} created but order update for form {} failed",
                created.id,
                form_id
            );
            SyncError::OrderDesync {
                entity: ENTITY,
                id: created.id,
                parent_id: form_id,
                source: Box::new(source),
            }
        })?;

        tracing::debug!("Added section {} to form {}", created.id, form_id);
        self.sections.push(created.clone());
        self.current = Some(created.clone());
        Ok(created)
    }

    /// Updates a section's payload fields remotely and replaces the cached
    /// entry in place. Never reorders.
    pub async fn update(&mut self, id: RecordId, patch: Fields) -> Result<Section, SyncError> {
        let rows = self
            .store
            .update(TABLE, &[Filter::eq("id", id)], serde_json::Value::Object(patch))
            .await?;
        let updated: Section = expect_single(rows, ENTITY)?;

        if let Some(slot) = self.sections.iter_mut().find(|s| s.id == updated.id) {
            *slot = updated.clone();
        }
        self.current = Some(updated.clone());
        Ok(updated)
    }

    /// Soft-deletes a section and removes it from the form's display order
    /// and from the cache. The remote row is never destroyed.
    ///
    /// If the order update fails the row is already marked deleted remotely;
    /// the cache keeps showing it until the next `list` refresh.
    pub async fn delete(&mut self, id: RecordId) -> Result<(), SyncError> {
        let rows = self
            .store
            .update(
                TABLE,
                &[Filter::eq("id", id)],
                json!({ "state": RecordState::Delete }),
            )
            .await?;
        let deleted: Section = expect_single(rows, ENTITY)?;
        let form_id = deleted.form_id;

        let order: Vec<RecordId> = self
            .order
            .get(&form_id)
            .map(|ids| ids.iter().copied().filter(|&other| other != id).collect())
            .unwrap_or_default();

        self.persist_order(form_id, order).await.map_err(|source| {
            tracing::warn!(
                "Section {} deleted remotely but order update for form {} failed",
                id,
                form_id
            );
            SyncError::OrderDesync {
                entity: ENTITY,
                id,
                parent_id: form_id,
                source: Box::new(source),
            }
        })?;

        self.sections.retain(|s| s.id != id);
        if self.current.as_ref().is_some_and(|s| s.id == id) {
            self.current = None;
        }
        tracing::debug!("Deleted section {} from form {}", id, form_id);
        Ok(())
    }

    /// Soft-deletes every section matching the AND-combined equality filters
    /// and removes the affected ids from the display order of the first
    /// affected section's form.
    ///
    /// The cached list is intentionally left alone; callers pair bulk deletes
    /// with a `list` refresh. All matches are assumed to share one form.
    pub async fn delete_by(&mut self, filters: Fields) -> Result<(), SyncError> {
        let filters: Vec<Filter> = filters
            .into_iter()
            .map(|(field, value)| Filter::Eq(field, value))
            .collect();

        let rows = self
            .store
            .update(TABLE, &filters, json!({ "state": RecordState::Delete }))
            .await?;
        let affected: Vec<Section> = decode_rows(rows, ENTITY)?;

        let Some(first) = affected.first() else {
            return Ok(());
        };
        let form_id = first.form_id;

        let affected_ids: HashSet<RecordId> = affected.iter().map(|s| s.id).collect();
        let order: Vec<RecordId> = self
            .order
            .get(&form_id)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| !affected_ids.contains(id))
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(
            "Bulk-deleted {} section(s) from form {}",
            affected.len(),
            form_id
        );
        self.persist_order(form_id, order).await
    }

    /// Persists a form's section order as an opaque id array on the form row,
    /// then replaces the order index entry for that form.
    ///
    /// On failure the index keeps its previous value.
    pub async fn persist_order(
        &mut self,
        form_id: RecordId,
        order: Vec<RecordId>,
    ) -> Result<(), SyncError> {
        self.store
            .update(
                PARENT_TABLE,
                &[Filter::eq("id", form_id)],
                json!({ ORDER_COLUMN: &order }),
            )
            .await?;

        self.order.insert(form_id, order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    struct TestContext {
        store: Arc<MemoryStore>,
        cache: SectionCache,
    }

    /// Form 1 with live sections 10 and 11, plus an already-deleted 12.
    async fn setup() -> TestContext {
        let store = Arc::new(MemoryStore::new());
        store.seed("form", vec![json!({ "id": 1, "section_order": [10, 11] })]);
        store.seed(
            "section",
            vec![
                json!({ "id": 10, "form_id": 1, "state": "Active", "title": "Intro" }),
                json!({ "id": 11, "form_id": 1, "state": "Active", "title": "Details" }),
                json!({ "id": 12, "form_id": 1, "state": "Delete", "title": "Old" }),
            ],
        );

        let mut cache = SectionCache::new(store.clone());
        cache.persist_order(1, vec![10, 11]).await.unwrap();
        TestContext { store, cache }
    }

    #[tokio::test]
    async fn test_list_excludes_deleted_sections() {
        let mut ctx = setup().await;

        let sections = ctx.cache.list(1).await.unwrap();
        assert_eq!(sections.len(), 2);
        assert!(sections.iter().all(|s| !s.state.is_deleted()));
        assert!(sections.iter().all(|s| s.id != 12));
    }

    #[tokio::test]
    async fn test_list_failure_keeps_previous_cache() {
        let mut ctx = setup().await;
        ctx.cache.list(1).await.unwrap();

        ctx.store.fail_next();
        assert!(ctx.cache.list(1).await.is_err());
        assert_eq!(ctx.cache.sections().len(), 2);
    }

    #[tokio::test]
    async fn test_add_appends_to_order_and_cache() {
        let mut ctx = setup().await;
        ctx.cache.list(1).await.unwrap();

        let created = ctx
            .cache
            .add(NewSection::new(1).with_field("title", json!("Wrap-up")))
            .await
            .unwrap();

        assert_eq!(ctx.cache.order(1).unwrap(), &[10, 11, created.id]);
        assert!(ctx.cache.sections().iter().any(|s| s.id == created.id));
        assert_eq!(ctx.cache.current().unwrap().id, created.id);

        // The order array landed on the form row.
        let form = &ctx.store.rows("form")[0];
        assert_eq!(form["section_order"], json!([10, 11, created.id]));
    }

    #[tokio::test]
    async fn test_add_with_unknown_order_starts_fresh() {
        let store = Arc::new(MemoryStore::new());
        store.seed("form", vec![json!({ "id": 2, "section_order": [] })]);
        let mut cache = SectionCache::new(store);

        let created = cache.add(NewSection::new(2)).await.unwrap();
        assert_eq!(cache.order(2).unwrap(), &[created.id]);
    }

    #[tokio::test]
    async fn test_update_replaces_entry_in_place() {
        let mut ctx = setup().await;
        ctx.cache.list(1).await.unwrap();

        let mut patch = Fields::new();
        patch.insert("title".to_string(), json!("Renamed"));
        let updated = ctx.cache.update(10, patch).await.unwrap();

        assert_eq!(updated.fields["title"], json!("Renamed"));
        // Position preserved: id 10 is still first.
        assert_eq!(ctx.cache.sections()[0].id, 10);
        assert_eq!(ctx.cache.sections()[0].fields["title"], json!("Renamed"));
        assert_eq!(ctx.cache.current().unwrap().id, 10);
    }

    #[tokio::test]
    async fn test_delete_updates_order_cache_and_keeps_remote_row() {
        let mut ctx = setup().await;
        ctx.cache.list(1).await.unwrap();

        ctx.cache.delete(10).await.unwrap();

        assert_eq!(ctx.cache.order(1).unwrap(), &[11]);
        assert!(ctx.cache.sections().iter().all(|s| s.id != 10));

        // Soft delete: the row survives remotely with state Delete.
        let rows = ctx.store.rows("section");
        let row = rows.iter().find(|r| r["id"] == json!(10)).unwrap();
        assert_eq!(row["state"], json!("Delete"));
    }

    #[tokio::test]
    async fn test_delete_clears_matching_current_selection() {
        let mut ctx = setup().await;
        let created = ctx.cache.add(NewSection::new(1)).await.unwrap();
        assert!(ctx.cache.current().is_some());

        ctx.cache.delete(created.id).await.unwrap();
        assert!(ctx.cache.current().is_none());
    }

    #[tokio::test]
    async fn test_persist_order_fully_replaces_previous_sequence() {
        let mut ctx = setup().await;

        ctx.cache.persist_order(1, vec![11, 10]).await.unwrap();
        assert_eq!(ctx.cache.order(1).unwrap(), &[11, 10]);

        ctx.cache.persist_order(1, vec![11]).await.unwrap();
        assert_eq!(ctx.cache.order(1).unwrap(), &[11]);
    }

    #[tokio::test]
    async fn test_persist_order_failure_keeps_index() {
        let mut ctx = setup().await;

        ctx.store.fail_next();
        assert!(ctx.cache.persist_order(1, vec![11, 10]).await.is_err());
        assert_eq!(ctx.cache.order(1).unwrap(), &[10, 11]);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let mut ctx = setup().await;
        ctx.cache.list(1).await.unwrap();

        ctx.cache.reset();
        assert!(ctx.cache.sections().is_empty());
        assert!(ctx.cache.current().is_none());
        assert!(ctx.cache.order_index().is_empty());

        ctx.cache.reset();
        assert!(ctx.cache.sections().is_empty());
        assert!(ctx.cache.current().is_none());
        assert!(ctx.cache.order_index().is_empty());
    }
}
