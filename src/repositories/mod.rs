//! Data access. The only layer that talks to a [`Store`].
//!
//! [`Repository`] is bound to one table and offers the operations every
//! resource shares. The per-table modules add their constants (table name,
//! embeddable relations) and the lookups specific to that resource.

pub mod auth_tokens;
pub mod clients;
pub mod communication_logs;
pub mod companies;
pub mod employees;
pub mod members;
pub mod milestones;
pub mod payments;
pub mod projects;
pub mod users;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::{value_text, Condition, Ordering, Query, Relation, Row, Store, StoreError};

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub filters: Vec<Condition>,
    pub order: Vec<Ordering>,
    /// `(offset, limit)`
    pub range: Option<(u64, u64)>,
}

/// One page of rows plus the exact number of rows matching the filters.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub rows: Vec<Row>,
    pub total: u64,
}

pub fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// A JSON object as a row; anything else is an empty row.
pub fn into_row(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn Store>,
    table: &'static str,
}

impl Repository {
    pub fn new(store: Arc<dyn Store>, table: &'static str) -> Self {
        Self { store, table }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    fn log(&self, operation: &str, err: StoreError) -> StoreError {
        if !err.is_no_rows() {
            tracing::error!(table = self.table, code = %err.code, "{} failed: {}", operation, err.message);
        }
        err
    }

    /// Filters, then ordering, then range; always with an exact count.
    pub async fn find_all(&self, options: FindOptions) -> Result<Page, StoreError> {
        let mut query = Query::new().filters(options.filters).exact_count();
        query.order = options.order;
        query.range = options.range;

        let selection = self
            .store
            .select(self.table, &query)
            .await
            .map_err(|e| self.log("find_all", e))?;

        let total = selection.count.unwrap_or(selection.rows.len() as u64);
        Ok(Page { rows: selection.rows, total })
    }

    /// Single row by id with `relations` embedded in the same query.
    pub async fn find_by_id(&self, id: &str, relations: &[Relation]) -> Result<Row, StoreError> {
        let query = relations
            .iter()
            .fold(Query::new().filter(Condition::eq("id", id)), |q, r| q.with(*r));

        self.store
            .select(self.table, &query)
            .await
            .map_err(|e| self.log("find_by_id", e))?
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::no_rows(self.table))
    }

    pub async fn find_where(&self, conditions: Vec<Condition>) -> Result<Vec<Row>, StoreError> {
        let query = Query::new().filters(conditions);
        Ok(self
            .store
            .select(self.table, &query)
            .await
            .map_err(|e| self.log("find_where", e))?
            .rows)
    }

    pub async fn find_one_where(&self, conditions: Vec<Condition>) -> Result<Option<Row>, StoreError> {
        Ok(self.find_where(conditions).await?.into_iter().next())
    }

    pub async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let query = Query::new().select(&["id"]).filter(Condition::eq("id", id));
        let selection = self
            .store
            .select(self.table, &query)
            .await
            .map_err(|e| self.log("exists", e))?;
        Ok(!selection.rows.is_empty())
    }

    pub async fn create(&self, row: Row) -> Result<Row, StoreError> {
        let created = self
            .store
            .insert(self.table, row)
            .await
            .map_err(|e| self.log("create", e))?;
        tracing::info!(table = self.table, id = ?created.get("id"), "created");
        Ok(created)
    }

    /// Patch one row by id. `updated_at` is always refreshed.
    pub async fn update(&self, id: &str, mut patch: Row) -> Result<Row, StoreError> {
        patch.insert("updated_at".to_string(), timestamp());
        let updated = self
            .store
            .update(self.table, &[Condition::eq("id", id)], patch)
            .await
            .map_err(|e| self.log("update", e))?;

        let row = updated.into_iter().next().ok_or_else(|| StoreError::no_rows(self.table))?;
        tracing::info!(table = self.table, id, "updated");
        Ok(row)
    }

    /// Patch every row matching `conditions`, returning how many changed.
    pub async fn update_where(&self, conditions: Vec<Condition>, mut patch: Row) -> Result<usize, StoreError> {
        patch.insert("updated_at".to_string(), timestamp());
        let updated = self
            .store
            .update(self.table, &conditions, patch)
            .await
            .map_err(|e| self.log("update_where", e))?;
        Ok(updated.len())
    }

    /// Hard delete. A missing row is reported as [`StoreError::NO_ROWS`].
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let removed = self
            .store
            .delete(self.table, &[Condition::eq("id", id)])
            .await
            .map_err(|e| self.log("delete", e))?;
        if removed == 0 {
            return Err(StoreError::no_rows(self.table));
        }
        tracing::info!(table = self.table, id, "deleted");
        Ok(())
    }

    /// Stamp `deleted_at` on the first live row matching `conditions`.
    pub async fn soft_delete(&self, mut conditions: Vec<Condition>) -> Result<Row, StoreError> {
        conditions.push(Condition::is_null("deleted_at"));
        let mut patch = Row::new();
        let now = timestamp();
        patch.insert("deleted_at".to_string(), now.clone());
        patch.insert("updated_at".to_string(), now);

        let updated = self
            .store
            .update(self.table, &conditions, patch)
            .await
            .map_err(|e| self.log("soft_delete", e))?;
        updated.into_iter().next().ok_or_else(|| StoreError::no_rows(self.table))
    }

    /// `id → display name` for the given ids, the name being `columns`
    /// joined with a space.
    pub async fn names_by_ids(&self, ids: &[String], columns: &[&str]) -> Result<HashMap<String, String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut selected = vec!["id"];
        selected.extend_from_slice(columns);
        let query = Query::new()
            .select(&selected)
            .filter(Condition::is_in("id", ids.iter().cloned().map(Value::String).collect()));

        let selection = self
            .store
            .select(self.table, &query)
            .await
            .map_err(|e| self.log("names_by_ids", e))?;

        Ok(selection
            .rows
            .iter()
            .filter_map(|row| {
                let id = row.get("id").and_then(value_text)?;
                let name = columns
                    .iter()
                    .filter_map(|c| row.get(*c).and_then(value_text))
                    .collect::<Vec<_>>()
                    .join(" ");
                Some((id, name))
            })
            .collect())
    }

    /// Number of rows per value of `column`, restricted to `values` and any
    /// extra conditions. Values with no rows map to zero.
    pub async fn count_by(
        &self,
        column: &str,
        values: &[String],
        extra: Vec<Condition>,
    ) -> Result<HashMap<String, u64>, StoreError> {
        let mut counts: HashMap<String, u64> = values.iter().map(|v| (v.clone(), 0)).collect();
        if values.is_empty() {
            return Ok(counts);
        }

        let query = Query::new()
            .select(&[column])
            .filter(Condition::is_in(column, values.iter().cloned().map(Value::String).collect()))
            .filters(extra);

        let selection = self
            .store
            .select(self.table, &query)
            .await
            .map_err(|e| self.log("count_by", e))?;

        for row in &selection.rows {
            if let Some(key) = row.get(column).and_then(value_text) {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    /// Distinct non-null values of `column` across the rows matching `conditions`.
    pub async fn pluck(&self, column: &str, conditions: Vec<Condition>) -> Result<Vec<String>, StoreError> {
        let query = Query::new().select(&[column]).filters(conditions);
        let selection = self
            .store
            .select(self.table, &query)
            .await
            .map_err(|e| self.log("pluck", e))?;

        let mut values: Vec<String> = selection
            .rows
            .iter()
            .filter_map(|row| row.get(column).and_then(value_text))
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }
}

/// Distinct non-null values of `column` in `rows`.
pub fn collect_ids(rows: &[Row], column: &str) -> Vec<String> {
    let mut ids: Vec<String> = rows.iter().filter_map(|r| r.get(column).and_then(value_text)).collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn repo(store: &Arc<MemoryStore>, table: &'static str) -> Repository {
        Repository::new(store.clone(), table)
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn find_all_reports_total_beyond_the_page() {
        let store = Arc::new(MemoryStore::new());
        let clients = repo(&store, "clients");
        for i in 0..5 {
            clients.create(row(json!({ "name": format!("c{}", i) }))).await.unwrap();
        }

        let page = clients
            .find_all(FindOptions {
                order: vec![Ordering { column: "name".into(), ascending: false }],
                range: Some((0, 2)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0]["name"], "c4");
    }

    #[tokio::test]
    async fn missing_rows_are_no_rows_errors() {
        let store = Arc::new(MemoryStore::new());
        let clients = repo(&store, "clients");
        let id = uuid::Uuid::new_v4().to_string();

        assert!(clients.find_by_id(&id, &[]).await.unwrap_err().is_no_rows());
        assert!(clients.update(&id, row(json!({ "name": "x" }))).await.unwrap_err().is_no_rows());
        assert!(clients.delete(&id).await.unwrap_err().is_no_rows());
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let store = Arc::new(MemoryStore::new());
        let clients = repo(&store, "clients");
        let created = clients
            .create(row(json!({ "name": "a", "updated_at": "2000-01-01T00:00:00Z" })))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = clients.update(id, row(json!({ "name": "b" }))).await.unwrap();
        assert_eq!(updated["name"], "b");
        assert_ne!(updated["updated_at"], "2000-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn soft_delete_only_hits_live_rows() {
        let store = Arc::new(MemoryStore::new());
        let members = repo(&store, "milestone_members");
        let m = members.create(row(json!({ "milestone_id": "m1", "deleted_at": null }))).await.unwrap();
        let id = m["id"].as_str().unwrap();

        let deleted = members.soft_delete(vec![Condition::eq("id", id)]).await.unwrap();
        assert!(deleted["deleted_at"].is_string());
        assert!(members.soft_delete(vec![Condition::eq("id", id)]).await.unwrap_err().is_no_rows());
        assert_eq!(store.len("milestone_members").await, 1);
    }

    #[tokio::test]
    async fn names_and_counts() {
        let store = Arc::new(MemoryStore::new());
        let clients = repo(&store, "clients");
        let projects = repo(&store, "projects");
        let a = clients.create(row(json!({ "name": "Ann", "family_name": "Lee" }))).await.unwrap();
        let a_id = a["id"].as_str().unwrap().to_string();
        projects.create(row(json!({ "client_id": a_id, "status": "active" }))).await.unwrap();
        projects.create(row(json!({ "client_id": a_id, "status": "completed" }))).await.unwrap();

        let names = clients.names_by_ids(&[a_id.clone()], &["name", "family_name"]).await.unwrap();
        assert_eq!(names[&a_id], "Ann Lee");

        let other = "nobody".to_string();
        let counts = projects.count_by("client_id", &[a_id.clone(), other.clone()], vec![]).await.unwrap();
        assert_eq!(counts[&a_id], 2);
        assert_eq!(counts[&other], 0);

        let active = projects
            .count_by("client_id", &[a_id.clone()], vec![Condition::eq("status", "active")])
            .await
            .unwrap();
        assert_eq!(active[&a_id], 1);
    }
}
