use std::sync::Arc;

use super::{CrudService, ResourceDef, ResourceService};
use crate::database::Store;
use crate::repositories::payments;
use crate::schema::payment::{PAYMENT, UPDATE_PAYMENT};
use crate::state::AppState;

pub static PAYMENTS: ResourceDef = ResourceDef {
    label: "Payment",
    table: payments::TABLE,
    permission: "payments",
    create_schema: &PAYMENT,
    update_schema: &UPDATE_PAYMENT,
    filters: &["status", "method", "projectId"],
    default_order: &[("date", false)],
    relations: &[],
};

pub struct PaymentService {
    crud: CrudService,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { crud: CrudService::new(&PAYMENTS, store) }
    }
}

impl ResourceService for PaymentService {
    fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }

    fn crud(&self) -> &CrudService {
        &self.crud
    }
}
