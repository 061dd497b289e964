//! In-process [`Store`] used by the test suite and `STORE_BACKEND=memory`.
//!
//! Mirrors the behaviours the service layer depends on: generated ids and
//! timestamps, exact counts, Postgres ordering (nulls last ascending),
//! unique constraints and `ON DELETE RESTRICT` foreign keys. Cascades are not
//! emulated.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{canonical_uuid, is_uuid_column, value_text, Condition, Ordering, Query, Row, Selection, Store, StoreError};

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub references: &'static str,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    foreign_keys: Vec<ForeignKey>,
    unique: Vec<(&'static str, &'static str)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the same restricting keys and unique columns as the
    /// Postgres migrations.
    pub fn with_schema() -> Self {
        Self::new()
            .restrict("projects", "client_id", "clients")
            .restrict("payments", "project_id", "projects")
            .restrict("communication_logs", "client_id", "clients")
            .restrict("communication_logs", "employee_id", "employees")
            .unique("users", "email")
    }

    pub fn restrict(mut self, table: &'static str, column: &'static str, references: &'static str) -> Self {
        self.foreign_keys.push(ForeignKey { table, column, references });
        self
    }

    pub fn unique(mut self, table: &'static str, column: &'static str) -> Self {
        self.unique.push((table, column));
        self
    }

    /// Number of rows currently stored in `table`.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map(Vec::len).unwrap_or(0)
    }

    fn check_unique(&self, tables: &HashMap<String, Vec<Row>>, table: &str, row: &Row, skip_id: Option<&Value>) -> Result<(), StoreError> {
        for (t, column) in self.unique.iter().filter(|(t, _)| *t == table) {
            let Some(value) = row.get(*column).and_then(value_text) else { continue };
            let clash = tables.get(*t).into_iter().flatten().any(|existing| {
                existing.get("id") != skip_id
                    && existing.get(*column).and_then(value_text).as_deref() == Some(value.as_str())
            });
            if clash {
                return Err(StoreError::new(
                    StoreError::UNIQUE_VIOLATION,
                    format!("duplicate key value violates unique constraint \"{}_{}_key\"", t, column),
                ));
            }
        }
        Ok(())
    }

    fn check_references(&self, tables: &HashMap<String, Vec<Row>>, table: &str, row: &Row) -> Result<(), StoreError> {
        for fk in self.foreign_keys.iter().filter(|fk| fk.table == table) {
            let Some(value) = row.get(fk.column).and_then(value_text) else { continue };
            let exists = tables
                .get(fk.references)
                .into_iter()
                .flatten()
                .any(|parent| parent.get("id").and_then(value_text).as_deref() == Some(value.as_str()));
            if !exists {
                return Err(StoreError::new(
                    StoreError::FOREIGN_KEY_VIOLATION,
                    format!(
                        "insert or update on table \"{}\" violates foreign key constraint \"{}_{}_fkey\"",
                        fk.table, fk.table, fk.column
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn matches(row: &Row, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| {
        let cell = row.get(condition.column()).and_then(value_text);
        let uuid = is_uuid_column(condition.column());
        let expected = |value: &Value| if uuid { canonical_uuid(value) } else { value_text(value) };
        match condition {
            Condition::Eq(_, value) if value.is_null() => cell.is_none(),
            Condition::Eq(_, value) => match expected(value) {
                Some(expected) => cell.as_deref() == Some(expected.as_str()),
                None => false,
            },
            Condition::In(_, values) => {
                cell.map(|c| values.iter().filter_map(|v| expected(v)).any(|v| v == c)).unwrap_or(false)
            }
            Condition::IsNull(_) => cell.is_none(),
        }
    })
}

/// Postgres default ordering: nulls sort after every other value.
fn compare(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Greater,
        (Some(_), None) => CmpOrdering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}

fn sort_rows(rows: &mut [Row], order: &[Ordering]) {
    rows.sort_by(|a, b| {
        for o in order {
            let ord = compare(a.get(&o.column), b.get(&o.column));
            let ord = if o.ascending { ord } else { ord.reverse() };
            if ord != CmpOrdering::Equal {
                return ord;
            }
        }
        CmpOrdering::Equal
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Selection, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(table)
            .into_iter()
            .flatten()
            .filter(|row| matches(row, &query.conditions))
            .cloned()
            .collect();

        let count = query.count.then_some(rows.len() as u64);

        sort_rows(&mut rows, &query.order);

        if let Some((offset, limit)) = query.range {
            rows = rows.into_iter().skip(offset as usize).take(limit as usize).collect();
        }

        for row in rows.iter_mut() {
            for relation in &query.relations {
                let target = row.get(relation.foreign_key).and_then(value_text).and_then(|id| {
                    tables
                        .get(relation.table)
                        .into_iter()
                        .flatten()
                        .find(|parent| parent.get("id").and_then(value_text).as_deref() == Some(id.as_str()))
                        .cloned()
                });
                row.insert(relation.name.to_string(), target.map(Value::Object).unwrap_or(Value::Null));
            }
        }

        if let Some(columns) = &query.columns {
            rows = rows
                .into_iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                        .collect()
                })
                .collect();
        }

        Ok(Selection { rows, count })
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write().await;

        if !row.contains_key("id") {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let stamp = now();
        row.entry("created_at").or_insert_with(|| stamp.clone());
        row.entry("updated_at").or_insert(stamp);

        self.check_unique(&tables, table, &row, None)?;
        self.check_references(&tables, table, &row)?;

        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, conditions: &[Condition], patch: Row) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;

        // Validate against a snapshot before mutating anything.
        let candidates: Vec<Row> = tables
            .get(table)
            .into_iter()
            .flatten()
            .filter(|row| matches(row, conditions))
            .map(|row| {
                let mut merged = row.clone();
                merged.extend(patch.clone());
                merged
            })
            .collect();
        for merged in &candidates {
            self.check_unique(&tables, table, merged, merged.get("id"))?;
            self.check_references(&tables, table, merged)?;
        }

        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, conditions)) {
                row.extend(patch.clone());
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, conditions: &[Condition]) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;

        let doomed: Vec<String> = tables
            .get(table)
            .into_iter()
            .flatten()
            .filter(|row| matches(row, conditions))
            .filter_map(|row| row.get("id").and_then(value_text))
            .collect();

        for fk in self.foreign_keys.iter().filter(|fk| fk.references == table) {
            let referenced = tables.get(fk.table).into_iter().flatten().any(|child| {
                child
                    .get(fk.column)
                    .and_then(value_text)
                    .map(|v| doomed.contains(&v))
                    .unwrap_or(false)
            });
            if referenced {
                return Err(StoreError::new(
                    StoreError::FOREIGN_KEY_VIOLATION,
                    format!(
                        "update or delete on table \"{}\" violates foreign key constraint \"{}_{}_fkey\" on table \"{}\"",
                        table, fk.table, fk.column, fk.table
                    ),
                ));
            }
        }

        let Some(rows) = tables.get_mut(table) else { return Ok(0) };
        let before = rows.len();
        rows.retain(|row| !matches(row, conditions));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Relation;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_generates_id_and_timestamps() {
        let store = MemoryStore::new();
        let inserted = store.insert("companies", row(json!({ "name": "Acme" }))).await.unwrap();
        assert!(Uuid::parse_str(inserted["id"].as_str().unwrap()).is_ok());
        assert!(inserted.contains_key("created_at"));
        assert_eq!(store.len("companies").await, 1);
    }

    #[tokio::test]
    async fn select_filters_before_ordering_before_range() {
        let store = MemoryStore::new();
        for (name, status) in [("d", "active"), ("a", "active"), ("c", "inactive"), ("b", "active")] {
            store.insert("clients", row(json!({ "name": name, "status": status }))).await.unwrap();
        }

        let query = Query::new()
            .filter(Condition::eq("status", "active"))
            .order_by("name", true)
            .range(1, 2)
            .exact_count();
        let selection = store.select("clients", &query).await.unwrap();
        let names: Vec<_> = selection.rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["b", "d"]);
        assert_eq!(selection.count, Some(3));
    }

    #[tokio::test]
    async fn nulls_sort_last_ascending() {
        let store = MemoryStore::new();
        store.insert("t", row(json!({ "n": null }))).await.unwrap();
        store.insert("t", row(json!({ "n": 2 }))).await.unwrap();
        store.insert("t", row(json!({ "n": 10 }))).await.unwrap();

        let asc = store.select("t", &Query::new().order_by("n", true)).await.unwrap();
        assert_eq!(asc.rows.iter().map(|r| r["n"].clone()).collect::<Vec<_>>(), vec![json!(2), json!(10), Value::Null]);
        let desc = store.select("t", &Query::new().order_by("n", false)).await.unwrap();
        assert_eq!(desc.rows[0]["n"], Value::Null);
    }

    #[tokio::test]
    async fn embeds_relations() {
        let store = MemoryStore::new();
        let company = store.insert("companies", row(json!({ "name": "Acme" }))).await.unwrap();
        store
            .insert("clients", row(json!({ "name": "Jo", "company_id": company["id"] })))
            .await
            .unwrap();
        store.insert("clients", row(json!({ "name": "Al" }))).await.unwrap();

        let query = Query::new()
            .order_by("name", true)
            .with(Relation { name: "company", table: "companies", foreign_key: "company_id" });
        let selection = store.select("clients", &query).await.unwrap();
        assert_eq!(selection.rows[0]["company"], Value::Null);
        assert_eq!(selection.rows[1]["company"]["name"], "Acme");
    }

    #[tokio::test]
    async fn restricting_keys_block_delete_and_dangling_inserts() {
        let store = MemoryStore::with_schema();
        let client = store.insert("clients", row(json!({ "name": "Jo" }))).await.unwrap();
        store
            .insert("projects", row(json!({ "name": "Site", "client_id": client["id"] })))
            .await
            .unwrap();

        let err = store.delete("clients", &[Condition::eq("id", client["id"].clone())]).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert_eq!(store.len("clients").await, 1);

        let err = store
            .insert("projects", row(json!({ "name": "Ghost", "client_id": Uuid::new_v4().to_string() })))
            .await
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn unique_columns() {
        let store = MemoryStore::with_schema();
        let a = store.insert("users", row(json!({ "email": "a@b.co" }))).await.unwrap();
        let err = store.insert("users", row(json!({ "email": "a@b.co" }))).await.unwrap_err();
        assert!(err.is_unique_violation());

        // updating a row to its own value is fine
        let updated = store
            .update("users", &[Condition::eq("id", a["id"].clone())], row(json!({ "email": "a@b.co" })))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_report_affected_rows() {
        let store = MemoryStore::new();
        let a = store.insert("t", row(json!({ "v": 1 }))).await.unwrap();
        let missing = Condition::eq("id", Uuid::new_v4().to_string());

        assert!(store.update("t", &[missing.clone()], row(json!({ "v": 2 }))).await.unwrap().is_empty());
        assert_eq!(store.delete("t", &[missing]).await.unwrap(), 0);
        assert_eq!(store.delete("t", &[Condition::eq("id", a["id"].clone())]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn uuid_filters_ignore_case() {
        let store = MemoryStore::new();
        let company = store.insert("companies", row(json!({ "name": "Acme" }))).await.unwrap();
        let id = company["id"].as_str().unwrap().to_string();
        store.insert("clients", row(json!({ "name": "a", "company_id": id }))).await.unwrap();

        let upper = Query::new().filter(Condition::eq("company_id", id.to_uppercase()));
        assert_eq!(store.select("clients", &upper).await.unwrap().rows.len(), 1);

        let listed = Query::new().filter(Condition::is_in("id", vec![json!(id.to_uppercase()), json!("x")]));
        assert_eq!(store.select("companies", &listed).await.unwrap().rows.len(), 1);

        let bogus = Query::new().filter(Condition::eq("company_id", "not-a-uuid"));
        assert!(store.select("clients", &bogus).await.unwrap().rows.is_empty());
    }
}
