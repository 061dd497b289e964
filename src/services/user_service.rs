//! Administration of user accounts.

use serde_json::{json, Value};
use std::sync::Arc;

use super::auth_service::internal;
use super::crud::to_api;
use super::{ListQuery, Listing, ServiceError};
use crate::auth::password::{hash_password, temporary_password};
use crate::auth::{AuthContext, Role};
use crate::config::AppConfig;
use crate::database::{is_valid_identifier, Condition, Ordering, Row, StoreError};
use crate::mailer::{deliver, Mailer};
use crate::repositories::{into_row, timestamp, users, FindOptions, Repository};
use crate::schema::auth::{INVITE_USER, UPDATE_USER};
use crate::state::AppState;
use crate::transform::{record_to_db, transform_column_name};

const SORTABLE: &[&str] = &["email", "name", "role", "is_active", "created_at", "updated_at"];

pub struct UserService {
    users: Repository,
    config: Arc<AppConfig>,
    mailer: Arc<dyn Mailer>,
}

fn store_error(err: StoreError) -> ServiceError {
    if err.is_no_rows() {
        ServiceError::not_found("User")
    } else if err.is_unique_violation() {
        ServiceError::Conflict("An account with this email already exists".to_string())
    } else {
        ServiceError::Store(err)
    }
}

impl UserService {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            users: Repository::new(state.store.clone(), users::TABLE),
            config: state.config.clone(),
            mailer: state.mailer.clone(),
        }
    }

    pub async fn list(&self, query: ListQuery) -> Result<Listing, ServiceError> {
        let mut order = Vec::with_capacity(query.order.len());
        for rule in &query.order {
            let column = transform_column_name(&rule.column);
            if !is_valid_identifier(&column) || !SORTABLE.contains(&column.as_str()) {
                return Err(ServiceError::BadRequest(format!("Cannot order by '{}'", rule.column)));
            }
            order.push(Ordering { column, ascending: rule.ascending });
        }
        if order.is_empty() {
            order.push(Ordering { column: "created_at".to_string(), ascending: false });
        }

        let mut filters = Vec::new();
        if let Some(role) = query.params.get("role").filter(|r| !r.is_empty()) {
            filters.push(Condition::eq("role", role.as_str()));
        }
        if let Some(active) = query.params.get("isActive").and_then(|v| v.parse::<bool>().ok()) {
            filters.push(Condition::eq("is_active", active));
        }

        let page = self
            .users
            .find_all(FindOptions {
                filters,
                order,
                range: Some((query.pagination.offset(), query.pagination.limit())),
            })
            .await
            .map_err(store_error)?;

        Ok(Listing {
            data: page.rows.into_iter().map(|row| to_api(users::public_view(row))).collect(),
            total: page.total,
            metadata: None,
        })
    }

    /// Create a verified account with a temporary password and mail it out.
    pub async fn invite(&self, input: &Value, caller: &AuthContext) -> Result<Value, ServiceError> {
        let record = INVITE_USER.parse(input)?;
        let email = record.get("email").and_then(Value::as_str).unwrap_or_default().trim().to_lowercase();

        if users::find_by_email(&self.users, &email).await.map_err(store_error)?.is_some() {
            return Err(ServiceError::Conflict("An account with this email already exists".to_string()));
        }

        let password = temporary_password();
        let password_hash = hash_password(&password).map_err(|e| internal("Password hashing failed", e))?;

        let mut row = record_to_db(&record);
        row.insert("email".to_string(), Value::String(email.clone()));
        row.insert("password_hash".to_string(), Value::String(password_hash));
        row.insert("is_active".to_string(), Value::Bool(true));
        row.insert("email_verified_at".to_string(), timestamp());

        let user = self.users.create(row).await.map_err(store_error)?;
        deliver("welcome", &email, self.mailer.send_welcome_email(&email, Some(&password))).await;

        tracing::info!(invited_by = %caller.user_id, email = %email, "user invited");
        Ok(to_api(users::public_view(user)))
    }

    /// Change name, role or active flag. Admins cannot demote or deactivate
    /// themselves.
    pub async fn update(&self, id: &str, input: &Value, caller: &AuthContext) -> Result<Value, ServiceError> {
        let record = UPDATE_USER.parse(input)?;

        if id == caller.user_id.to_string() {
            let demoted = record
                .get("role")
                .and_then(Value::as_str)
                .map(|role| role != Role::Admin.as_str())
                .unwrap_or(false);
            let deactivated = record.get("isActive") == Some(&Value::Bool(false));
            if demoted || deactivated {
                return Err(ServiceError::Forbidden(
                    "You cannot demote or deactivate your own account".to_string(),
                ));
            }
        }

        if record.is_empty() {
            let user = self.users.find_by_id(id, &[]).await.map_err(store_error)?;
            return Ok(to_api(users::public_view(user)));
        }

        let user = self.users.update(id, record_to_db(&record)).await.map_err(store_error)?;
        tracing::info!(user_id = id, by = %caller.user_id, "user updated");
        Ok(to_api(users::public_view(user)))
    }

    /// Used by the admin CLI. Creates, or promotes and reactivates, an admin
    /// account with the given password.
    pub async fn ensure_admin(&self, email: &str, name: &str, password: &str) -> Result<Value, ServiceError> {
        let min = self.config.security.min_password_length;
        if password.chars().count() < min {
            return Err(ServiceError::BadRequest(format!("Password must be at least {} characters", min)));
        }
        let password_hash = hash_password(password).map_err(|e| internal("Password hashing failed", e))?;
        let email = email.trim().to_lowercase();

        let existing = users::find_by_email(&self.users, &email).await.map_err(store_error)?;
        let user = match existing.and_then(|u| u.get("id").and_then(Value::as_str).map(str::to_string)) {
            Some(id) => {
                let patch = into_row(json!({
                    "role": Role::Admin.as_str(),
                    "is_active": true,
                    "password_hash": password_hash,
                    "email_verified_at": timestamp(),
                }));
                self.users.update(&id, patch).await.map_err(store_error)?
            }
            None => {
                let row: Row = into_row(json!({
                    "email": email,
                    "name": name,
                    "password_hash": password_hash,
                    "role": Role::Admin.as_str(),
                    "is_active": true,
                    "email_verified_at": timestamp(),
                }));
                self.users.create(row).await.map_err(store_error)?
            }
        };
        Ok(to_api(users::public_view(user)))
    }
}
