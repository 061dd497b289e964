use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::crud::{to_api, Operation};
use super::{CrudService, ListQuery, Listing, ResourceDef, ResourceService, ServiceError};
use crate::auth::AuthContext;
use crate::database::Store;
use crate::repositories::{clients, collect_ids, projects, Repository};
use crate::schema::project::{PROJECT, UPDATE_PROJECT};
use crate::state::AppState;

pub static PROJECTS: ResourceDef = ResourceDef {
    label: "Project",
    table: projects::TABLE,
    permission: "projects",
    create_schema: &PROJECT,
    update_schema: &UPDATE_PROJECT,
    filters: &["status", "priority", "paymentTerms", "clientId", "projectManager"],
    default_order: &[("created_at", false)],
    relations: &[projects::CLIENT],
};

pub struct ProjectService {
    crud: CrudService,
    clients: Repository,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            crud: CrudService::new(&PROJECTS, store.clone()),
            clients: Repository::new(store, clients::TABLE),
        }
    }
}

#[async_trait]
impl ResourceService for ProjectService {
    fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }

    fn crud(&self) -> &CrudService {
        &self.crud
    }

    async fn list(&self, query: ListQuery, _caller: &AuthContext) -> Result<Listing, ServiceError> {
        let page = self.crud.list(&query).await?;
        let client_names = clients::names(&self.clients, &collect_ids(&page.rows, "client_id"))
            .await
            .map_err(|e| self.crud.store_error(e, Operation::Read))?;

        Ok(Listing {
            data: page.rows.into_iter().map(to_api).collect(),
            total: page.total,
            metadata: Some(json!({ "clientNames": client_names })),
        })
    }
}
