//! HTTP remote store backend.
//!
//! Speaks the PostgREST dialect used by hosted Postgres backends: filters go
//! in the query string (`field=eq.value`), writes ask for the affected rows
//! back with `Prefer: return=representation`, and every request carries the
//! project API key.

use async_trait::async_trait;
use serde_json::Value;

use super::{Filter, RemoteStore, StoreError};
use crate::config::RemoteConfig;

/// PostgREST-style remote store client.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// Creates a client for the given endpoint.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Creates a client from loaded configuration.
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the REST endpoint URL for a table.
    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    /// Renders filters as PostgREST query pairs: `("state", "neq.Delete")`.
    fn filter_query(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| match f {
                Filter::Eq(field, value) => (field.clone(), format!("eq.{}", scalar(value))),
                Filter::Neq(field, value) => (field.clone(), format!("neq.{}", scalar(value))),
            })
            .collect()
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Checks the response status and decodes the row payload.
    async fn read_rows(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

/// Query-string rendering of a scalar filter value.
///
/// PostgREST takes bare values: strings unquoted, numbers and booleans in
/// their literal form.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(&Self::filter_query(filters))
            .send()
            .await?;

        Self::read_rows(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        Self::read_rows(response).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self
            .authed(self.client.patch(self.table_url(table)))
            .query(&Self::filter_query(filters))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        Self::read_rows(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_url() {
        let store = RestStore::new("http://localhost:54321", "key");
        assert_eq!(store.table_url("section"), "http://localhost:54321/rest/v1/section");

        let store = RestStore::new("https://project.example.co/", "key");
        assert_eq!(store.table_url("question"), "https://project.example.co/rest/v1/question");
    }

    #[test]
    fn test_filter_query_rendering() {
        let filters = vec![
            Filter::eq("form_id", 3),
            Filter::neq("state", "Delete"),
        ];
        assert_eq!(
            RestStore::filter_query(&filters),
            vec![
                ("form_id".to_string(), "eq.3".to_string()),
                ("state".to_string(), "neq.Delete".to_string()),
            ]
        );
    }

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(scalar(&json!("easy")), "easy");
        assert_eq!(scalar(&json!(42)), "42");
        assert_eq!(scalar(&json!(true)), "true");
        assert_eq!(scalar(&Value::Null), "null");
    }
}
