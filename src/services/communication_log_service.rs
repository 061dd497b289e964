use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::crud::{to_api, Operation};
use super::{CrudService, ListQuery, Listing, ResourceDef, ResourceService, ServiceError};
use crate::auth::AuthContext;
use crate::database::Store;
use crate::repositories::{clients, collect_ids, communication_logs, employees, Repository};
use crate::schema::communication_log::{COMMUNICATION_LOG, UPDATE_COMMUNICATION_LOG};
use crate::state::AppState;

pub static COMMUNICATION_LOGS: ResourceDef = ResourceDef {
    label: "Communication log",
    table: communication_logs::TABLE,
    permission: "communications",
    create_schema: &COMMUNICATION_LOG,
    update_schema: &UPDATE_COMMUNICATION_LOG,
    filters: &["channel", "clientId", "employeeId", "followUpRequired"],
    default_order: &[("date", false)],
    relations: &[],
};

pub struct CommunicationLogService {
    crud: CrudService,
    clients: Repository,
    employees: Repository,
}

impl CommunicationLogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            crud: CrudService::new(&COMMUNICATION_LOGS, store.clone()),
            clients: Repository::new(store.clone(), clients::TABLE),
            employees: Repository::new(store, employees::TABLE),
        }
    }
}

#[async_trait]
impl ResourceService for CommunicationLogService {
    fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }

    fn crud(&self) -> &CrudService {
        &self.crud
    }

    async fn list(&self, query: ListQuery, _caller: &AuthContext) -> Result<Listing, ServiceError> {
        let page = self.crud.list(&query).await?;
        let client_ids = collect_ids(&page.rows, "client_id");
        let employee_ids = collect_ids(&page.rows, "employee_id");

        let (client_names, employee_names) = tokio::try_join!(
            clients::names(&self.clients, &client_ids),
            employees::names(&self.employees, &employee_ids),
        )
        .map_err(|e| self.crud.store_error(e, Operation::Read))?;

        Ok(Listing {
            data: page.rows.into_iter().map(to_api).collect(),
            total: page.total,
            metadata: Some(json!({ "clientNames": client_names, "employeeNames": employee_names })),
        })
    }
}
