//! SQL text generation for [`PgStore`](super::PgStore).
//!
//! Rows travel as `jsonb`: selects return `to_jsonb(t)` (with embedded
//! relations merged in), writes go through `jsonb_populate_record` so Postgres
//! does the type coercion from JSON. Every value is a bound parameter; only
//! validated identifiers are interpolated.

use serde_json::Value;

use super::{canonical_uuid, is_uuid_column, is_valid_identifier, value_text, Condition, Query, Row, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    TextArray(Vec<String>),
    Json(Value),
}

#[derive(Debug, Clone)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

pub struct QueryBuilder;

impl QueryBuilder {
    pub fn select(table: &str, query: &Query) -> Result<SqlStatement, StoreError> {
        let table = quote(table)?;
        let mut params = Vec::new();

        let mut row_expr = match &query.columns {
            Some(columns) if !columns.is_empty() => {
                let pairs = columns
                    .iter()
                    .map(|c| Ok(format!("'{}', t.{}", c, quote(c)?)))
                    .collect::<Result<Vec<_>, StoreError>>()?;
                format!("jsonb_build_object({})", pairs.join(", "))
            }
            _ => "to_jsonb(t)".to_string(),
        };

        let mut joins = Vec::new();
        for (i, relation) in query.relations.iter().enumerate() {
            let alias = format!("r{}", i);
            row_expr.push_str(&format!(
                " || jsonb_build_object('{}', to_jsonb({}))",
                relation.name, alias
            ));
            joins.push(format!(
                "LEFT JOIN {} AS {} ON {}.\"id\" = t.{}",
                quote(relation.table)?,
                alias,
                alias,
                quote(relation.foreign_key)?
            ));
        }

        let where_clause = where_clause(&query.conditions, &mut params)?;
        let order_clause = if query.order.is_empty() {
            String::new()
        } else {
            let parts = query
                .order
                .iter()
                .map(|o| Ok(format!("t.{} {}", quote(&o.column)?, if o.ascending { "ASC" } else { "DESC" })))
                .collect::<Result<Vec<_>, StoreError>>()?;
            format!("ORDER BY {}", parts.join(", "))
        };
        let limit_clause = match query.range {
            Some((offset, limit)) => format!("LIMIT {} OFFSET {}", limit, offset),
            None => String::new(),
        };

        let sql = [
            format!("SELECT {} AS row", row_expr),
            format!("FROM {} AS t", table),
            joins.join(" "),
            where_clause,
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlStatement { sql, params })
    }

    pub fn count(table: &str, query: &Query) -> Result<SqlStatement, StoreError> {
        let mut params = Vec::new();
        let where_clause = where_clause(&query.conditions, &mut params)?;
        let sql = [format!("SELECT COUNT(*) AS count FROM {} AS t", quote(table)?), where_clause]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(SqlStatement { sql, params })
    }

    pub fn insert(table: &str, row: &Row) -> Result<SqlStatement, StoreError> {
        let quoted = quote(table)?;
        if row.is_empty() {
            return Ok(SqlStatement {
                sql: format!("INSERT INTO {} AS t DEFAULT VALUES RETURNING to_jsonb(t) AS row", quoted),
                params: vec![],
            });
        }

        let columns = row.keys().map(|c| quote(c)).collect::<Result<Vec<_>, _>>()?;
        let selected = columns.iter().map(|c| format!("r.{}", c)).collect::<Vec<_>>();
        let sql = format!(
            "INSERT INTO {table} AS t ({cols}) SELECT {vals} FROM jsonb_populate_record(NULL::{table}, $1) AS r RETURNING to_jsonb(t) AS row",
            table = quoted,
            cols = columns.join(", "),
            vals = selected.join(", "),
        );
        Ok(SqlStatement { sql, params: vec![SqlParam::Json(Value::Object(row.clone()))] })
    }

    pub fn update(table: &str, conditions: &[Condition], patch: &Row) -> Result<SqlStatement, StoreError> {
        let quoted = quote(table)?;
        if patch.is_empty() {
            return Err(StoreError::new(StoreError::INVALID_NAME, "Update requires at least one column"));
        }

        let assignments = patch
            .keys()
            .map(|c| quote(c).map(|q| format!("{q} = r.{q}")))
            .collect::<Result<Vec<_>, _>>()?;

        let mut params = vec![SqlParam::Json(Value::Object(patch.clone()))];
        let where_clause = where_clause(conditions, &mut params)?;
        let sql = format!(
            "UPDATE {table} AS t SET {set} FROM jsonb_populate_record(NULL::{table}, $1) AS r {where_clause} RETURNING to_jsonb(t) AS row",
            table = quoted,
            set = assignments.join(", "),
        );
        Ok(SqlStatement { sql, params })
    }

    pub fn delete(table: &str, conditions: &[Condition]) -> Result<SqlStatement, StoreError> {
        let mut params = Vec::new();
        let where_clause = where_clause(conditions, &mut params)?;
        let sql = [format!("DELETE FROM {} AS t", quote(table)?), where_clause]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(SqlStatement { sql, params })
    }
}

fn quote(name: &str) -> Result<String, StoreError> {
    if is_valid_identifier(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(StoreError::new(StoreError::INVALID_NAME, format!("Invalid identifier: {}", name)))
    }
}

/// Uuid columns are compared against a parameter cast to `uuid`, so primary
/// key and foreign key indexes apply; a value that is not a uuid matches
/// nothing. Other columns compare in their text form, which is a no-op cast
/// for text columns.
fn where_clause(conditions: &[Condition], params: &mut Vec<SqlParam>) -> Result<String, StoreError> {
    if conditions.is_empty() {
        return Ok(String::new());
    }

    let mut parts = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let column = quote(condition.column())?;
        let uuid = is_uuid_column(condition.column());
        match condition {
            Condition::Eq(_, value) if value.is_null() => parts.push(format!("t.{} IS NULL", column)),
            Condition::Eq(_, value) if uuid => match canonical_uuid(value) {
                Some(id) => {
                    params.push(SqlParam::Text(id));
                    parts.push(format!("t.{} = ${}::uuid", column, params.len()));
                }
                None => parts.push("FALSE".to_string()),
            },
            Condition::Eq(_, value) => match value_text(value) {
                Some(text) => {
                    params.push(SqlParam::Text(text));
                    parts.push(format!("t.{}::text = ${}", column, params.len()));
                }
                None => parts.push(format!("t.{} IS NULL", column)),
            },
            Condition::In(_, values) => {
                let texts: Vec<String> = if uuid {
                    values.iter().filter_map(canonical_uuid).collect()
                } else {
                    values.iter().filter_map(value_text).collect()
                };
                if texts.is_empty() {
                    parts.push("FALSE".to_string());
                } else if uuid {
                    params.push(SqlParam::TextArray(texts));
                    parts.push(format!("t.{} = ANY(${}::uuid[])", column, params.len()));
                } else {
                    params.push(SqlParam::TextArray(texts));
                    parts.push(format!("t.{}::text = ANY(${})", column, params.len()));
                }
            }
            Condition::IsNull(_) => parts.push(format!("t.{} IS NULL", column)),
        }
    }
    Ok(format!("WHERE {}", parts.join(" AND ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Relation;
    use serde_json::json;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440001";

    #[test]
    fn select_with_filters_order_and_range() {
        let query = Query::new()
            .filter(Condition::eq("gender", "female"))
            .filter(Condition::eq("status", "active"))
            .order_by("created_at", false)
            .order_by("name", true)
            .range(20, 10);

        let stmt = QueryBuilder::select("clients", &query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT to_jsonb(t) AS row FROM \"clients\" AS t WHERE t.\"gender\"::text = $1 AND t.\"status\"::text = $2 ORDER BY t.\"created_at\" DESC, t.\"name\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            stmt.params,
            vec![SqlParam::Text("female".into()), SqlParam::Text("active".into())]
        );
    }

    #[test]
    fn select_embeds_relations_in_one_query() {
        let query = Query::new()
            .filter(Condition::eq("id", ID))
            .with(Relation { name: "company", table: "companies", foreign_key: "company_id" });
        let stmt = QueryBuilder::select("clients", &query).unwrap();
        assert!(stmt.sql.contains("to_jsonb(t) || jsonb_build_object('company', to_jsonb(r0))"));
        assert!(stmt.sql.contains("LEFT JOIN \"companies\" AS r0 ON r0.\"id\" = t.\"company_id\""));
    }

    #[test]
    fn projection_and_in_lists() {
        let query = Query::new()
            .select(&["id", "name"])
            .filter(Condition::is_in("status", vec![json!("a"), json!("b")]))
            .filter(Condition::is_null("deleted_at"));
        let stmt = QueryBuilder::select("companies", &query).unwrap();
        assert!(stmt.sql.starts_with("SELECT jsonb_build_object('id', t.\"id\", 'name', t.\"name\") AS row"));
        assert!(stmt.sql.contains("t.\"status\"::text = ANY($1) AND t.\"deleted_at\" IS NULL"));
        assert_eq!(stmt.params, vec![SqlParam::TextArray(vec!["a".into(), "b".into()])]);

        let empty = Query::new().filter(Condition::is_in("id", vec![]));
        assert!(QueryBuilder::count("companies", &empty).unwrap().sql.ends_with("WHERE FALSE"));
    }

    #[test]
    fn uuid_columns_keep_their_indexes() {
        let upper = ID.to_uppercase();
        let query = Query::new()
            .filter(Condition::eq("company_id", upper.as_str()))
            .filter(Condition::is_in("client_id", vec![json!(ID), json!("bogus")]));
        let stmt = QueryBuilder::select("clients", &query).unwrap();
        assert!(stmt.sql.contains("WHERE t.\"company_id\" = $1::uuid AND t.\"client_id\" = ANY($2::uuid[])"));
        assert!(!stmt.sql.contains("\"company_id\"::text"));
        assert_eq!(
            stmt.params,
            vec![SqlParam::Text(ID.into()), SqlParam::TextArray(vec![ID.into()])]
        );

        let bogus = QueryBuilder::count("clients", &Query::new().filter(Condition::eq("id", "x"))).unwrap();
        assert!(bogus.sql.ends_with("WHERE FALSE"));
        assert!(bogus.params.is_empty());
    }

    #[test]
    fn rejects_hostile_identifiers() {
        let query = Query::new().order_by("name; DROP TABLE clients", true);
        let err = QueryBuilder::select("clients", &query).unwrap_err();
        assert_eq!(err.code, StoreError::INVALID_NAME);
    }

    #[test]
    fn writes_go_through_populate_record() {
        let mut row = Row::new();
        row.insert("name".into(), json!("Acme"));
        row.insert("status".into(), json!("active"));

        let insert = QueryBuilder::insert("companies", &row).unwrap();
        assert_eq!(
            insert.sql,
            "INSERT INTO \"companies\" AS t (\"name\", \"status\") SELECT r.\"name\", r.\"status\" FROM jsonb_populate_record(NULL::\"companies\", $1) AS r RETURNING to_jsonb(t) AS row"
        );

        let update = QueryBuilder::update("companies", &[Condition::eq("id", ID)], &row).unwrap();
        assert!(update.sql.contains("SET \"name\" = r.\"name\", \"status\" = r.\"status\""));
        assert!(update.sql.contains("WHERE t.\"id\" = $2::uuid"));
        assert_eq!(update.params.len(), 2);
    }

    #[test]
    fn delete_and_count() {
        let stmt = QueryBuilder::delete("payments", &[Condition::eq("id", ID)]).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM \"payments\" AS t WHERE t.\"id\" = $1::uuid");

        let count = QueryBuilder::count("payments", &Query::new()).unwrap();
        assert_eq!(count.sql, "SELECT COUNT(*) AS count FROM \"payments\" AS t");
    }
}
