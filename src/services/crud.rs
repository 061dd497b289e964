//! Validate → transform → repository → transform back, shared by every
//! CRUD resource.

use serde_json::Value;
use std::sync::Arc;

use super::{ListQuery, ResourceDef, ServiceError};
use crate::database::{is_valid_identifier, Condition, Ordering, Row, Store, StoreError};
use crate::pagination::OrderRule;
use crate::repositories::{FindOptions, Page, Repository};
use crate::transform::{record_to_db, to_snake_case, transform_column_name, transform_from_db};

/// Columns every table has besides its schema fields.
const SYSTEM_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Delete,
}

/// Storage row → wire record.
pub fn to_api(row: Row) -> Value {
    transform_from_db(&Value::Object(row))
}

pub struct CrudService {
    def: &'static ResourceDef,
    repo: Repository,
}

impl CrudService {
    pub fn new(def: &'static ResourceDef, store: Arc<dyn Store>) -> Self {
        Self { def, repo: Repository::new(store, def.table) }
    }

    pub fn def(&self) -> &'static ResourceDef {
        self.def
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Normalise a store failure for this resource.
    pub fn store_error(&self, err: StoreError, operation: Operation) -> ServiceError {
        if err.is_no_rows() {
            return ServiceError::not_found(self.def.label);
        }
        if err.is_foreign_key_violation() {
            return match operation {
                Operation::Delete => ServiceError::still_referenced(self.def.label),
                _ => ServiceError::BadRequest("Referenced record does not exist".to_string()),
            };
        }
        if err.is_unique_violation() {
            return ServiceError::Conflict(format!("{} already exists", self.def.label));
        }
        ServiceError::Store(err)
    }

    /// Storage ordering for a list request. Columns must be schema fields or
    /// system columns; an empty request falls back to the resource default.
    pub fn ordering(&self, rules: &[OrderRule]) -> Result<Vec<Ordering>, ServiceError> {
        if rules.is_empty() {
            return Ok(self
                .def
                .default_order
                .iter()
                .map(|(column, ascending)| Ordering { column: column.to_string(), ascending: *ascending })
                .collect());
        }

        rules
            .iter()
            .map(|rule| {
                let column = transform_column_name(&rule.column);
                if !is_valid_identifier(&column) || !self.is_sortable(&column) {
                    return Err(ServiceError::BadRequest(format!("Cannot order by '{}'", rule.column)));
                }
                Ok(Ordering { column, ascending: rule.ascending })
            })
            .collect()
    }

    fn is_sortable(&self, column: &str) -> bool {
        SYSTEM_COLUMNS.contains(&column)
            || self.def.create_schema.fields().iter().any(|f| to_snake_case(f.name) == column)
    }

    /// Equality filters for the resource's filterable query parameters.
    pub fn filters(&self, query: &ListQuery) -> Vec<Condition> {
        self.def
            .filters
            .iter()
            .filter_map(|key| {
                let value = query.params.get(*key).filter(|v| !v.is_empty())?;
                Some(Condition::eq(to_snake_case(key), value.as_str()))
            })
            .collect()
    }

    /// One page of storage rows with the exact total.
    pub async fn list(&self, query: &ListQuery) -> Result<Page, ServiceError> {
        let options = FindOptions {
            filters: self.filters(query),
            order: self.ordering(&query.order)?,
            range: Some((query.pagination.offset(), query.pagination.limit())),
        };
        tracing::debug!(table = self.def.table, ?options, "list");
        self.repo.find_all(options).await.map_err(|e| self.store_error(e, Operation::Read))
    }

    pub async fn get_row(&self, id: &str) -> Result<Row, ServiceError> {
        self.repo
            .find_by_id(id, self.def.relations)
            .await
            .map_err(|e| self.store_error(e, Operation::Read))
    }

    pub async fn get(&self, id: &str) -> Result<Value, ServiceError> {
        self.get_row(id).await.map(to_api)
    }

    pub async fn create(&self, input: &Value) -> Result<Value, ServiceError> {
        let record = self.def.create_schema.parse(input)?;
        let created = self
            .repo
            .create(record_to_db(&record))
            .await
            .map_err(|e| self.store_error(e, Operation::Write))?;
        Ok(to_api(created))
    }

    pub async fn update(&self, id: &str, input: &Value) -> Result<Value, ServiceError> {
        let record = self.def.update_schema.parse(input)?;
        if record.is_empty() {
            return self.get(id).await;
        }

        let updated = self
            .repo
            .update(id, record_to_db(&record))
            .await
            .map_err(|e| self.store_error(e, Operation::Write))?;
        Ok(to_api(updated))
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.repo.delete(id).await.map_err(|e| self.store_error(e, Operation::Delete))
    }
}
