use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use super::crud::{to_api, Operation};
use super::{CrudService, ListQuery, Listing, ResourceDef, ResourceService, ServiceError};
use crate::auth::{AuthContext, Role};
use crate::database::{value_text, Row, Store};
use crate::repositories::{clients, collect_ids, companies, members, projects, Repository};
use crate::schema::client::{CLIENT, UPDATE_CLIENT};
use crate::state::AppState;

pub static CLIENTS: ResourceDef = ResourceDef {
    label: "Client",
    table: clients::TABLE,
    permission: "clients",
    create_schema: &CLIENT,
    update_schema: &UPDATE_CLIENT,
    filters: &["gender", "status", "title", "companyId"],
    default_order: &[("created_at", false)],
    relations: &[clients::COMPANY],
};

/// Clients, with row visibility limited for employees to the clients of
/// projects they are a member of.
pub struct ClientService {
    crud: CrudService,
    companies: Repository,
    projects: Repository,
    project_members: Repository,
}

impl ClientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            crud: CrudService::new(&CLIENTS, store.clone()),
            companies: Repository::new(store.clone(), companies::TABLE),
            projects: Repository::new(store.clone(), projects::TABLE),
            project_members: Repository::new(store, members::PROJECT_MEMBERS),
        }
    }

    /// `None` when the caller sees every client.
    async fn visible_ids(&self, caller: &AuthContext) -> Result<Option<HashSet<String>>, ServiceError> {
        if caller.user_role != Some(Role::Employee) {
            return Ok(None);
        }
        let ids = clients::visible_to_user(&self.project_members, &self.projects, &caller.user_id.to_string())
            .await
            .map_err(|e| self.crud.store_error(e, Operation::Read))?;
        Ok(Some(ids))
    }

    /// Company names and project counts for the clients on this page.
    async fn metadata(&self, rows: &[Row]) -> Result<Value, ServiceError> {
        let company_ids = collect_ids(rows, "company_id");
        let client_ids = collect_ids(rows, "id");

        let (company_names, project_counts) = tokio::try_join!(
            companies::names(&self.companies, &company_ids),
            projects::counts_by_client(&self.projects, &client_ids),
        )
        .map_err(|e| self.crud.store_error(e, Operation::Read))?;

        Ok(json!({ "companyNames": company_names, "projectCounts": project_counts }))
    }
}

#[async_trait]
impl ResourceService for ClientService {
    fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }

    fn crud(&self) -> &CrudService {
        &self.crud
    }

    /// Employee filtering happens after the page is fetched, so an employee
    /// can receive fewer rows than `pageSize` while `total` still counts
    /// every client.
    async fn list(&self, query: ListQuery, caller: &AuthContext) -> Result<Listing, ServiceError> {
        let visible = self.visible_ids(caller).await?;
        let mut page = self.crud.list(&query).await?;

        if let Some(visible) = &visible {
            page.rows.retain(|row| {
                row.get("id").and_then(value_text).map(|id| visible.contains(&id)).unwrap_or(false)
            });
        }

        let metadata = self.metadata(&page.rows).await?;
        Ok(Listing { data: page.rows.into_iter().map(to_api).collect(), total: page.total, metadata: Some(metadata) })
    }

    /// Inaccessible clients are reported exactly like missing ones.
    async fn get(&self, id: &str, caller: &AuthContext) -> Result<Value, ServiceError> {
        if let Some(visible) = self.visible_ids(caller).await? {
            if !visible.contains(id) {
                tracing::warn!(user_id = %caller.user_id, client_id = id, "client outside employee visibility");
                return Err(ServiceError::not_found(CLIENTS.label));
            }
        }
        self.crud.get(id).await
    }
}
