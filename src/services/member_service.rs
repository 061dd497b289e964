//! Project and milestone membership rows. Removal is a soft delete.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

use super::crud::to_api;
use super::ServiceError;
use crate::database::{Condition, Store, StoreError};
use crate::repositories::{members, milestones, projects, Repository};
use crate::schema::member::{MILESTONE_MEMBER, PROJECT_MEMBER};
use crate::schema::Schema;
use crate::transform::{record_to_db, to_snake_case};

/// One kind of membership: which parent it hangs off and who can join.
pub struct Membership {
    /// Parent label used in not-found messages (`"Project"`).
    pub label: &'static str,
    pub parent_table: &'static str,
    pub table: &'static str,
    pub parent_column: &'static str,
    /// Wire name of the member reference (`"userId"`).
    pub member_field: &'static str,
    /// Permission prefix of the parent resource.
    pub permission: &'static str,
    pub schema: &'static Lazy<Schema>,
}

impl Membership {
    pub fn permission(&self, action: &str) -> String {
        format!("{}:{}", self.permission, action)
    }
}

pub static PROJECT_MEMBERSHIP: Membership = Membership {
    label: "Project",
    parent_table: projects::TABLE,
    table: members::PROJECT_MEMBERS,
    parent_column: "project_id",
    member_field: "userId",
    permission: "projects",
    schema: &PROJECT_MEMBER,
};

pub static MILESTONE_MEMBERSHIP: Membership = Membership {
    label: "Milestone",
    parent_table: milestones::TABLE,
    table: members::MILESTONE_MEMBERS,
    parent_column: "milestone_id",
    member_field: "employeeId",
    permission: "milestones",
    schema: &MILESTONE_MEMBER,
};

pub struct MemberService {
    kind: &'static Membership,
    parents: Repository,
    members: Repository,
}

impl MemberService {
    pub fn new(kind: &'static Membership, store: Arc<dyn Store>) -> Self {
        Self {
            kind,
            parents: Repository::new(store.clone(), kind.parent_table),
            members: Repository::new(store, kind.table),
        }
    }

    pub fn kind(&self) -> &'static Membership {
        self.kind
    }

    fn store_error(&self, err: StoreError) -> ServiceError {
        if err.is_foreign_key_violation() {
            return ServiceError::BadRequest("Referenced record does not exist".to_string());
        }
        ServiceError::Store(err)
    }

    async fn ensure_parent(&self, parent_id: &str) -> Result<(), ServiceError> {
        match self.parents.exists(parent_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ServiceError::not_found(self.kind.label)),
            Err(e) => Err(self.store_error(e)),
        }
    }

    pub async fn list(&self, parent_id: &str) -> Result<Vec<Value>, ServiceError> {
        self.ensure_parent(parent_id).await?;
        let rows = members::active(&self.members, self.kind.parent_column, parent_id)
            .await
            .map_err(|e| self.store_error(e))?;
        Ok(rows.into_iter().map(to_api).collect())
    }

    pub async fn add(&self, parent_id: &str, input: &Value) -> Result<Value, ServiceError> {
        let record = self.kind.schema.parse(input)?;
        self.ensure_parent(parent_id).await?;

        let member_column = to_snake_case(self.kind.member_field);
        let member_id = record.get(self.kind.member_field).cloned().unwrap_or(Value::Null);
        let existing = self
            .members
            .find_one_where(vec![
                Condition::eq(self.kind.parent_column, parent_id),
                Condition::eq(member_column, member_id),
                Condition::is_null("deleted_at"),
            ])
            .await
            .map_err(|e| self.store_error(e))?;
        if existing.is_some() {
            return Err(ServiceError::Conflict("Already a member".to_string()));
        }

        let mut row = record_to_db(&record);
        row.insert(self.kind.parent_column.to_string(), Value::String(parent_id.to_string()));
        let created = self.members.create(row).await.map_err(|e| self.store_error(e))?;
        Ok(to_api(created))
    }

    pub async fn remove(&self, parent_id: &str, member_id: &str) -> Result<(), ServiceError> {
        self.ensure_parent(parent_id).await?;
        match self
            .members
            .soft_delete(vec![Condition::eq("id", member_id), Condition::eq(self.kind.parent_column, parent_id)])
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_no_rows() => Err(ServiceError::not_found("Member")),
            Err(e) => Err(self.store_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    async fn setup() -> (MemberService, String) {
        let store = Arc::new(MemoryStore::new());
        let project = Repository::new(store.clone(), projects::TABLE)
            .create(json!({ "name": "Site" }).as_object().cloned().unwrap())
            .await
            .unwrap();
        let id = project["id"].as_str().unwrap().to_string();
        (MemberService::new(&PROJECT_MEMBERSHIP, store), id)
    }

    #[tokio::test]
    async fn add_list_remove() {
        let (service, project_id) = setup().await;
        let user_id = uuid::Uuid::new_v4().to_string();

        let member = service.add(&project_id, &json!({ "userId": user_id, "role": "lead" })).await.unwrap();
        assert_eq!(member["projectId"], project_id.as_str());
        assert!(matches!(
            service.add(&project_id, &json!({ "userId": user_id })).await,
            Err(ServiceError::Conflict(_))
        ));

        assert_eq!(service.list(&project_id).await.unwrap().len(), 1);
        let member_id = member["id"].as_str().unwrap();
        service.remove(&project_id, member_id).await.unwrap();
        assert!(service.list(&project_id).await.unwrap().is_empty());
        assert!(matches!(service.remove(&project_id, member_id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn parent_must_exist() {
        let (service, _) = setup().await;
        let missing = uuid::Uuid::new_v4().to_string();
        let err = service.list(&missing).await.unwrap_err();
        assert_eq!(err.to_string(), "Project not found");
    }

    #[tokio::test]
    async fn member_reference_is_validated() {
        let (service, project_id) = setup().await;
        assert!(matches!(
            service.add(&project_id, &json!({ "userId": "" })).await,
            Err(ServiceError::Validation(_))
        ));
    }
}
