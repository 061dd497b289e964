//! Business rules between the HTTP handlers and the repositories.
//!
//! Every resource service validates input through its schemas, converts
//! between wire (camelCase) and storage (snake_case) keys, calls its
//! repositories and normalises failures into [`ServiceError`].

pub mod auth_service;
pub mod client_service;
pub mod communication_log_service;
pub mod company_service;
pub mod crud;
pub mod employee_service;
pub mod member_service;
pub mod milestone_service;
pub mod payment_service;
pub mod project_service;
pub mod user_service;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

use crate::auth::AuthContext;
use crate::database::{Relation, StoreError};
use crate::pagination::{parse_order_by, parse_pagination, OrderRule, Pagination};
use crate::schema::{Schema, ValidationError};
use crate::state::AppState;

pub use auth_service::AuthService;
pub use client_service::ClientService;
pub use communication_log_service::CommunicationLogService;
pub use company_service::CompanyService;
pub use crud::CrudService;
pub use employee_service::EmployeeService;
pub use member_service::MemberService;
pub use milestone_service::MilestoneService;
pub use payment_service::PaymentService;
pub use project_service::ProjectService;
pub use user_service::UserService;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Carries the resource label; displays as `"<label> not found"`.
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(label: impl Into<String>) -> Self {
        ServiceError::NotFound(label.into())
    }

    /// 409 for a delete refused because of dependent records:
    /// `"Cannot delete <label>: <reason>"`.
    pub fn delete_blocked(label: &str, reason: impl std::fmt::Display) -> Self {
        ServiceError::Conflict(format!("Cannot delete {}: {}", label.to_lowercase(), reason))
    }

    /// A foreign key still points at the row.
    pub fn still_referenced(label: &str) -> Self {
        Self::delete_blocked(label, "it is still referenced by other records")
    }

    /// A company whose clients still have active projects.
    pub fn active_projects(label: &str, active: u64) -> Self {
        Self::delete_blocked(label, format!("its clients have {} active project(s)", active))
    }
}

/// Parsed list request: route-level pagination, ordering and raw filters.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub pagination: Pagination,
    pub order: Vec<OrderRule>,
    /// Remaining query parameters; each resource picks its filterable keys.
    pub params: HashMap<String, String>,
}

impl ListQuery {
    pub fn from_params(params: HashMap<String, String>) -> Self {
        Self {
            pagination: parse_pagination(&params),
            order: parse_order_by(params.get("orderBy").map(String::as_str)),
            params,
        }
    }
}

/// One page of wire records plus what the envelope needs.
#[derive(Debug, Clone)]
pub struct Listing {
    pub data: Vec<Value>,
    pub total: u64,
    pub metadata: Option<Value>,
}

/// Static description of a CRUD resource.
pub struct ResourceDef {
    /// Singular display name used in messages (`"Client"`).
    pub label: &'static str,
    pub table: &'static str,
    /// Permission prefix (`"clients"` for `clients:read`).
    pub permission: &'static str,
    pub create_schema: &'static Lazy<Schema>,
    pub update_schema: &'static Lazy<Schema>,
    /// Query parameters (camelCase) accepted as equality filters on list.
    pub filters: &'static [&'static str],
    /// Storage ordering applied when the request has no `orderBy`.
    pub default_order: &'static [(&'static str, bool)],
    /// Relations embedded by `get`.
    pub relations: &'static [Relation],
}

impl ResourceDef {
    pub fn permission(&self, action: &str) -> String {
        format!("{}:{}", self.permission, action)
    }
}

/// The five CRUD operations as the handlers see them. Defaults delegate to
/// the shared [`CrudService`]; resources override what they specialise.
#[async_trait]
pub trait ResourceService: Sized + Send + Sync + 'static {
    fn from_state(state: &AppState) -> Self;

    fn crud(&self) -> &CrudService;

    fn resource(&self) -> &'static ResourceDef {
        self.crud().def()
    }

    async fn list(&self, query: ListQuery, _caller: &AuthContext) -> Result<Listing, ServiceError> {
        let page = self.crud().list(&query).await?;
        Ok(Listing { data: page.rows.into_iter().map(crud::to_api).collect(), total: page.total, metadata: None })
    }

    async fn get(&self, id: &str, _caller: &AuthContext) -> Result<Value, ServiceError> {
        self.crud().get(id).await
    }

    async fn create(&self, input: Value, _caller: &AuthContext) -> Result<Value, ServiceError> {
        self.crud().create(&input).await
    }

    async fn update(&self, id: &str, input: Value, _caller: &AuthContext) -> Result<Value, ServiceError> {
        self.crud().update(id, &input).await
    }

    async fn delete(&self, id: &str, _caller: &AuthContext) -> Result<(), ServiceError> {
        self.crud().delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_conflicts_share_one_format() {
        assert_eq!(
            ServiceError::still_referenced("Project").to_string(),
            "Cannot delete project: it is still referenced by other records"
        );
        assert_eq!(
            ServiceError::active_projects("Company", 2).to_string(),
            "Cannot delete company: its clients have 2 active project(s)"
        );
    }
}
