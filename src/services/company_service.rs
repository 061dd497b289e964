use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::crud::{to_api, Operation};
use super::{CrudService, ListQuery, Listing, ResourceDef, ResourceService, ServiceError};
use crate::auth::AuthContext;
use crate::database::{Condition, Row, Store, StoreError};
use crate::repositories::{clients, collect_ids, companies, projects, Repository};
use crate::schema::company::{COMPANY, UPDATE_COMPANY};
use crate::state::AppState;

pub static COMPANIES: ResourceDef = ResourceDef {
    label: "Company",
    table: companies::TABLE,
    permission: "companies",
    create_schema: &COMPANY,
    update_schema: &UPDATE_COMPANY,
    filters: &["status", "industry"],
    default_order: &[("created_at", false)],
    relations: &[],
};

pub struct CompanyService {
    crud: CrudService,
    clients: Repository,
    projects: Repository,
}

impl CompanyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            crud: CrudService::new(&COMPANIES, store.clone()),
            clients: Repository::new(store.clone(), clients::TABLE),
            projects: Repository::new(store, projects::TABLE),
        }
    }
}

#[async_trait]
impl ResourceService for CompanyService {
    fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }

    fn crud(&self) -> &CrudService {
        &self.crud
    }

    async fn list(&self, query: ListQuery, _caller: &AuthContext) -> Result<Listing, ServiceError> {
        let page = self.crud.list(&query).await?;
        let client_counts = self
            .clients
            .count_by("company_id", &collect_ids(&page.rows, "id"), vec![])
            .await
            .map_err(|e| self.crud.store_error(e, Operation::Read))?;

        Ok(Listing {
            data: page.rows.into_iter().map(to_api).collect(),
            total: page.total,
            metadata: Some(json!({ "clientCounts": client_counts })),
        })
    }

    /// Refused while any of the company's clients has an active project.
    /// Remaining clients are detached first, so a failed delete never
    /// leaves a client pointing at a removed company.
    async fn delete(&self, id: &str, caller: &AuthContext) -> Result<(), ServiceError> {
        let read = |e: StoreError| self.crud.store_error(e, Operation::Read);

        if !self.crud.repository().exists(id).await.map_err(read)? {
            return Err(ServiceError::not_found(COMPANIES.label));
        }

        let client_ids = clients::ids_for_company(&self.clients, id).await.map_err(read)?;
        let active = projects::active_count_for_clients(&self.projects, &client_ids)
            .await
            .map_err(read)?;
        if active > 0 {
            tracing::warn!(company_id = id, active, user_id = %caller.user_id, "company delete blocked");
            return Err(ServiceError::active_projects(COMPANIES.label, active));
        }

        if !client_ids.is_empty() {
            let mut detach = Row::new();
            detach.insert("company_id".to_string(), Value::Null);
            self.clients
                .update_where(vec![Condition::eq("company_id", id)], detach)
                .await
                .map_err(|e| self.crud.store_error(e, Operation::Write))?;
        }

        self.crud.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::database::{MemoryStore, Query, Selection};
    use uuid::Uuid;

    /// Memory store whose client updates fail.
    struct FailingClientUpdates(MemoryStore);

    #[async_trait]
    impl Store for FailingClientUpdates {
        async fn select(&self, table: &str, query: &Query) -> Result<Selection, StoreError> {
            self.0.select(table, query).await
        }

        async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
            self.0.insert(table, row).await
        }

        async fn update(&self, table: &str, conditions: &[Condition], patch: Row) -> Result<Vec<Row>, StoreError> {
            if table == clients::TABLE {
                return Err(StoreError::new(StoreError::CONNECTION_FAILURE, "connection reset"));
            }
            self.0.update(table, conditions, patch).await
        }

        async fn delete(&self, table: &str, conditions: &[Condition]) -> Result<u64, StoreError> {
            self.0.delete(table, conditions).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.0.ping().await
        }
    }

    fn caller() -> AuthContext {
        AuthContext { user_id: Uuid::new_v4(), user_role: Some(Role::Admin), user_email: "admin@example.com".into() }
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn failed_detach_keeps_the_company() {
        let store: Arc<dyn Store> = Arc::new(FailingClientUpdates(MemoryStore::new()));
        let company = store.insert(companies::TABLE, row(json!({ "name": "Acme" }))).await.unwrap();
        let id = company["id"].as_str().unwrap().to_string();
        store
            .insert(clients::TABLE, row(json!({ "name": "Jo", "company_id": id })))
            .await
            .unwrap();

        let service = CompanyService::new(store.clone());
        assert!(matches!(service.delete(&id, &caller()).await, Err(ServiceError::Store(_))));
        assert!(service.crud.repository().exists(&id).await.unwrap());
    }

    #[tokio::test]
    async fn active_projects_block_with_shared_message() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let company = store.insert(companies::TABLE, row(json!({ "name": "Acme" }))).await.unwrap();
        let id = company["id"].as_str().unwrap().to_string();
        let client = store
            .insert(clients::TABLE, row(json!({ "name": "Jo", "company_id": id })))
            .await
            .unwrap();
        store
            .insert(projects::TABLE, row(json!({ "name": "Site", "client_id": client["id"], "status": "active" })))
            .await
            .unwrap();

        let err = CompanyService::new(store).delete(&id, &caller()).await.unwrap_err();
        assert_eq!(err.to_string(), ServiceError::active_projects("Company", 1).to_string());
    }
}
