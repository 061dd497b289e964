use std::sync::Arc;

use super::{CrudService, ResourceDef, ResourceService};
use crate::database::Store;
use crate::repositories::employees;
use crate::schema::employee::{EMPLOYEE, UPDATE_EMPLOYEE};
use crate::state::AppState;

pub static EMPLOYEES: ResourceDef = ResourceDef {
    label: "Employee",
    table: employees::TABLE,
    permission: "employees",
    create_schema: &EMPLOYEE,
    update_schema: &UPDATE_EMPLOYEE,
    filters: &["gender", "status", "department", "title"],
    default_order: &[("created_at", false)],
    relations: &[],
};

pub struct EmployeeService {
    crud: CrudService,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { crud: CrudService::new(&EMPLOYEES, store) }
    }
}

impl ResourceService for EmployeeService {
    fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }

    fn crud(&self) -> &CrudService {
        &self.crud
    }
}
