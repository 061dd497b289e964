use std::sync::Arc;

use super::{CrudService, ResourceDef, ResourceService};
use crate::database::Store;
use crate::repositories::milestones;
use crate::schema::milestone::{MILESTONE, UPDATE_MILESTONE};
use crate::state::AppState;

/// Milestones list in their position within the project unless asked otherwise.
pub static MILESTONES: ResourceDef = ResourceDef {
    label: "Milestone",
    table: milestones::TABLE,
    permission: "milestones",
    create_schema: &MILESTONE,
    update_schema: &UPDATE_MILESTONE,
    filters: &["status", "projectId"],
    default_order: &[("order", true)],
    relations: &[],
};

pub struct MilestoneService {
    crud: CrudService,
}

impl MilestoneService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { crud: CrudService::new(&MILESTONES, store) }
    }
}

impl ResourceService for MilestoneService {
    fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }

    fn crud(&self) -> &CrudService {
        &self.crud
    }
}
