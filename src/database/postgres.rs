use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Postgres};

use super::query_builder::{QueryBuilder, SqlParam, SqlStatement};
use super::{Condition, Query, Row, Selection, Store, StoreError};

/// [`Store`] backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows(&self, stmt: &SqlStatement) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(sql = %stmt.sql, "executing query");
        let mut q = sqlx::query_scalar::<_, Value>(&stmt.sql);
        for p in stmt.params.iter() {
            q = bind_param_scalar(q, p);
        }
        let values = q.fetch_all(&self.pool).await?;
        Ok(values.into_iter().filter_map(into_row).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Selection, StoreError> {
        let rows = self.fetch_rows(&QueryBuilder::select(table, query)?).await?;

        let count = if query.count {
            let stmt = QueryBuilder::count(table, query)?;
            let mut q = sqlx::query_scalar::<_, i64>(&stmt.sql);
            for p in stmt.params.iter() {
                q = bind_param_scalar(q, p);
            }
            Some(q.fetch_one(&self.pool).await?.max(0) as u64)
        } else {
            None
        };

        Ok(Selection { rows, count })
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        self.fetch_rows(&QueryBuilder::insert(table, &row)?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::no_rows(table))
    }

    async fn update(&self, table: &str, conditions: &[Condition], patch: Row) -> Result<Vec<Row>, StoreError> {
        self.fetch_rows(&QueryBuilder::update(table, conditions, &patch)?).await
    }

    async fn delete(&self, table: &str, conditions: &[Condition]) -> Result<u64, StoreError> {
        let stmt = QueryBuilder::delete(table, conditions)?;
        tracing::debug!(sql = %stmt.sql, "executing delete");
        let mut q = sqlx::query(&stmt.sql);
        for p in stmt.params.iter() {
            q = bind_param_query(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn into_row(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match p {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::TextArray(v) => q.bind(v.clone()),
        SqlParam::Json(v) => q.bind(sqlx::types::Json(v.clone())),
    }
}

fn bind_param_scalar<'q, O>(
    q: sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::QueryScalar<'q, Postgres, O, PgArguments> {
    match p {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::TextArray(v) => q.bind(v.clone()),
        SqlParam::Json(v) => q.bind(sqlx::types::Json(v.clone())),
    }
}
