//! In-memory remote store backend.
//!
//! Backs the test suites and offline usage with the same contract as the
//! HTTP client: serial id assignment on insert, AND-combined filter matching,
//! merge-patch update. Failures can be scheduled with [`MemoryStore::fail_in`]
//! to exercise the error paths of the cache components.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Filter, RemoteStore, StoreError};

struct Inner {
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    fail_at: Option<usize>,
}

/// In-memory table store.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                tables: HashMap::new(),
                next_id: 1,
                fail_at: None,
            }),
        }
    }

    /// Inserts rows verbatim, without assigning ids. Advances the id counter
    /// past any explicit `id` column so later inserts stay unique.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut inner = self.inner.lock().unwrap();
        for row in &rows {
            if let Some(id) = row.get("id").and_then(Value::as_i64) {
                inner.next_id = inner.next_id.max(id + 1);
            }
        }
        inner.tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Schedules the `n`-th operation from now to fail (1 = the next one).
    pub fn fail_in(&self, n: usize) {
        self.inner.lock().unwrap().fail_at = Some(n);
    }

    /// Schedules the next operation to fail.
    pub fn fail_next(&self) {
        self.fail_in(1);
    }

    /// Every row of a table, including soft-deleted ones.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

impl Inner {
    fn tick_failure(&mut self) -> Result<(), StoreError> {
        if let Some(n) = self.fail_at {
            if n <= 1 {
                self.fail_at = None;
                return Err(StoreError::Rejected {
                    status: 500,
                    message: "injected failure".to_string(),
                });
            }
            self.fail_at = Some(n - 1);
        }
        Ok(())
    }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.tick_failure()?;

        Ok(inner
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.tick_failure()?;

        let mut row = match row {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: format!("expected a JSON object row, got {}", other),
                })
            }
        };

        if !row.contains_key("id") {
            let id = inner.next_id;
            inner.next_id += 1;
            row.insert("id".to_string(), Value::from(id));
        }
        if !row.contains_key("state") {
            row.insert("state".to_string(), Value::from("Active"));
        }

        let stored = Value::Object(row);
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());

        Ok(vec![stored])
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.tick_failure()?;

        let patch = match patch {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: format!("expected a JSON object patch, got {}", other),
                })
            }
        };

        let mut affected = Vec::new();
        if let Some(rows) = inner.tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !matches_all(row, filters) {
                    continue;
                }
                if let Value::Object(map) = row {
                    for (key, value) in &patch {
                        map.insert(key.clone(), value.clone());
                    }
                }
                affected.push(row.clone());
            }
        }

        Ok(affected)
    }
}
