//! Query execution seam.
//!
//! [`Store`] is the query builder the repository layer talks to: filtered,
//! ordered, ranged selects with an exact count, plus insert/update/delete on
//! JSON rows keyed by storage (snake_case) column names. Two backends exist:
//! [`postgres::PgStore`] over sqlx and [`memory::MemoryStore`] for tests and
//! local runs.

pub mod manager;
pub mod memory;
pub mod postgres;
pub mod query_builder;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A row keyed by storage column names.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq(column.into(), value.into())
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Condition::In(column.into(), values)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull(column.into())
    }

    pub fn column(&self) -> &str {
        match self {
            Condition::Eq(c, _) | Condition::In(c, _) | Condition::IsNull(c) => c,
        }
    }
}

/// Storage-level ordering (column already in snake_case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub ascending: bool,
}

/// A to-one relation embedded under `name` by joining `table.id = row.foreign_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub table: &'static str,
    pub foreign_key: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub columns: Option<Vec<String>>,
    pub conditions: Vec<Condition>,
    pub order: Vec<Ordering>,
    /// `(offset, limit)`
    pub range: Option<(u64, u64)>,
    pub relations: Vec<Relation>,
    pub count: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn filters(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(Ordering { column: column.into(), ascending });
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.range = Some((offset, limit));
        self
    }

    pub fn with(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn exact_count(mut self) -> Self {
        self.count = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub rows: Vec<Row>,
    /// Present when the query asked for an exact count.
    pub count: Option<u64>,
}

/// Structured store failure. `code` follows Postgres SQLSTATE codes, plus
/// [`StoreError::NO_ROWS`] for "expected one row, found none".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub const NO_ROWS: &'static str = "PGRST116";
    pub const FOREIGN_KEY_VIOLATION: &'static str = "23503";
    pub const UNIQUE_VIOLATION: &'static str = "23505";
    pub const INVALID_NAME: &'static str = "42602";
    pub const CONNECTION_FAILURE: &'static str = "08006";
    pub const INTERNAL: &'static str = "XX000";

    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self { code: code.to_string(), message: message.into() }
    }

    pub fn no_rows(table: &str) -> Self {
        Self::new(Self::NO_ROWS, format!("No rows found in {}", table))
    }

    pub fn is_no_rows(&self) -> bool {
        self.code == Self::NO_ROWS
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.code == Self::FOREIGN_KEY_VIOLATION
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code == Self::UNIQUE_VIOLATION
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::new(Self::NO_ROWS, "No rows returned"),
            sqlx::Error::Database(db) => StoreError::new(
                db.code().as_deref().unwrap_or(Self::INTERNAL),
                db.message().to_string(),
            ),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::new(Self::CONNECTION_FAILURE, err.to_string())
            }
            other => StoreError::new(Self::INTERNAL, other.to_string()),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Selection, StoreError>;

    /// Insert one row, returning it as stored (with generated id and timestamps).
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Apply `patch` to every matching row, returning the updated rows.
    async fn update(&self, table: &str, conditions: &[Condition], patch: Row) -> Result<Vec<Row>, StoreError>;

    /// Delete every matching row, returning how many were removed.
    async fn delete(&self, table: &str, conditions: &[Condition]) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Text form used when comparing a JSON value against a column.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Columns of type `uuid`: the primary key, every `*_id` reference and
/// `project_manager`.
pub fn is_uuid_column(name: &str) -> bool {
    name == "id" || name.ends_with("_id") || name == "project_manager"
}

/// Canonical lowercase form of a uuid value. `None` when the value is not a
/// uuid, so it cannot equal any uuid cell.
pub fn canonical_uuid(value: &Value) -> Option<String> {
    value.as_str().and_then(|s| uuid::Uuid::parse_str(s).ok()).map(|id| id.to_string())
}

/// Storage identifiers: letters, digits and underscores, not starting with a digit.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("created_at"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("name;drop table"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn uuid_columns_compare_canonically() {
        assert!(is_uuid_column("id"));
        assert!(is_uuid_column("company_id"));
        assert!(is_uuid_column("project_manager"));
        assert!(!is_uuid_column("email"));
        assert_eq!(
            canonical_uuid(&json!("550E8400-E29B-41D4-A716-446655440001")),
            Some("550e8400-e29b-41d4-a716-446655440001".to_string())
        );
        assert_eq!(canonical_uuid(&json!("not-a-uuid")), None);
        assert_eq!(canonical_uuid(&json!(7)), None);
    }

    #[test]
    fn value_text_forms() {
        assert_eq!(value_text(&json!("a")), Some("a".to_string()));
        assert_eq!(value_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_text(&json!(12)), Some("12".to_string()));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn query_builder_methods_compose() {
        let q = Query::new()
            .filter(Condition::eq("status", "active"))
            .order_by("name", true)
            .range(20, 10)
            .exact_count();
        assert_eq!(q.conditions.len(), 1);
        assert_eq!(q.range, Some((20, 10)));
        assert!(q.count);
    }
}
