//! Account lifecycle: signup, email verification, login, password reset.
//!
//! Outgoing mail never affects the result of the request that triggered it.

use serde_json::{json, Value};
use std::sync::Arc;

use super::crud::to_api;
use super::ServiceError;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{EMAIL_VERIFICATION, PASSWORD_RESET};
use crate::auth::{generate_jwt, AuthContext, Claims, Role};
use crate::config::AppConfig;
use crate::database::{value_text, Row};
use crate::mailer::{deliver, Mailer};
use crate::repositories::{auth_tokens, into_row, timestamp, users, Repository};
use crate::schema::auth::{FORGOT_PASSWORD, LOGIN, RESET_PASSWORD, SIGNUP, VERIFY_EMAIL};
use crate::schema::{Record, ValidationError};
use crate::state::AppState;

/// Role given to self-registered accounts.
pub const SIGNUP_ROLE: Role = Role::Viewer;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_TOKEN: &str = "Invalid or expired token";

pub struct AuthService {
    users: Repository,
    tokens: Repository,
    config: Arc<AppConfig>,
    mailer: Arc<dyn Mailer>,
}

fn text<'a>(record: &'a Record, field: &str) -> &'a str {
    record.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn row_text(row: &Row, column: &str) -> String {
    row.get(column).and_then(value_text).unwrap_or_default()
}

pub fn internal(context: &str, err: impl std::fmt::Display) -> ServiceError {
    tracing::error!("{}: {}", context, err);
    ServiceError::Internal(context.to_string())
}

impl AuthService {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            users: Repository::new(state.store.clone(), users::TABLE),
            tokens: Repository::new(state.store.clone(), auth_tokens::TABLE),
            config: state.config.clone(),
            mailer: state.mailer.clone(),
        }
    }

    /// The configured minimum may be stricter than the schema's.
    fn check_password_length(&self, password: &str) -> Result<(), ServiceError> {
        let min = self.config.security.min_password_length;
        if password.chars().count() < min {
            return Err(ValidationError::single("password", format!("Password must be at least {} characters", min)).into());
        }
        Ok(())
    }

    pub async fn signup(&self, input: &Value) -> Result<Value, ServiceError> {
        let record = SIGNUP.parse(input)?;
        let password = text(&record, "password");
        self.check_password_length(password)?;

        let email = text(&record, "email").trim().to_lowercase();
        if users::find_by_email(&self.users, &email).await?.is_some() {
            return Err(ServiceError::Conflict("An account with this email already exists".to_string()));
        }

        let password_hash = hash_password(password).map_err(|e| internal("Password hashing failed", e))?;
        let row = json!({
            "email": email,
            "name": text(&record, "name"),
            "password_hash": password_hash,
            "role": SIGNUP_ROLE.as_str(),
            "is_active": true,
            "email_verified_at": null,
        });
        let user = self.users.create(into_row(row)).await.map_err(|e| {
            if e.is_unique_violation() {
                ServiceError::Conflict("An account with this email already exists".to_string())
            } else {
                ServiceError::Store(e)
            }
        })?;

        let user_id = row_text(&user, "id");
        let token = auth_tokens::issue(
            &self.tokens,
            &user_id,
            EMAIL_VERIFICATION,
            self.config.security.verification_token_hours,
        )
        .await?;
        deliver("verification", &email, self.mailer.send_verification_email(&email, &token)).await;

        tracing::info!(user_id = %user_id, "account registered");
        Ok(to_api(users::public_view(user)))
    }

    pub async fn verify_email(&self, input: &Value) -> Result<Value, ServiceError> {
        let record = VERIFY_EMAIL.parse(input)?;
        let user_id = auth_tokens::consume(&self.tokens, text(&record, "token"), EMAIL_VERIFICATION)
            .await?
            .ok_or_else(|| ServiceError::BadRequest(INVALID_TOKEN.to_string()))?;

        let mut patch = Row::new();
        patch.insert("email_verified_at".to_string(), timestamp());
        let user = self.users.update(&user_id, patch).await.map_err(|e| {
            if e.is_no_rows() {
                ServiceError::BadRequest(INVALID_TOKEN.to_string())
            } else {
                ServiceError::Store(e)
            }
        })?;

        let email = row_text(&user, "email");
        deliver("welcome", &email, self.mailer.send_welcome_email(&email, None)).await;

        tracing::info!(user_id = %user_id, "email verified");
        Ok(to_api(users::public_view(user)))
    }

    /// Returns `{ token, user }`.
    pub async fn login(&self, input: &Value) -> Result<Value, ServiceError> {
        let record = LOGIN.parse(input)?;
        let email = text(&record, "email");

        let Some(user) = users::find_by_email(&self.users, email).await? else {
            tracing::warn!(email, "login for unknown account");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let matches = verify_password(text(&record, "password"), &row_text(&user, "password_hash"))
            .map_err(|e| internal("Stored password hash is unreadable", e))?;
        if !matches {
            tracing::warn!(email, "login with wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        if !users::is_active(&user) {
            return Err(ServiceError::Forbidden("Account is deactivated".to_string()));
        }
        if !users::is_verified(&user) {
            return Err(ServiceError::Forbidden("Email address has not been verified".to_string()));
        }

        let user_id = uuid::Uuid::parse_str(&row_text(&user, "id")).map_err(|e| internal("User id is not a UUID", e))?;
        let role = Role::parse(&row_text(&user, "role")).unwrap_or(Role::Viewer);
        let claims = Claims::new(user_id, row_text(&user, "email"), role, self.config.security.jwt_expiry_hours);
        let token = generate_jwt(&claims, &self.config.security).map_err(|e| internal("Token generation failed", e))?;

        tracing::info!(user_id = %user_id, "login");
        Ok(json!({ "token": token, "user": to_api(users::public_view(user)) }))
    }

    /// Succeeds whether or not the address belongs to an account.
    pub async fn forgot_password(&self, input: &Value) -> Result<(), ServiceError> {
        let record = FORGOT_PASSWORD.parse(input)?;
        let email = text(&record, "email");

        let user = match users::find_by_email(&self.users, email).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("password reset lookup failed: {}", e);
                return Ok(());
            }
        };
        let Some(user) = user.filter(users::is_active) else {
            tracing::debug!("password reset for unknown or inactive account");
            return Ok(());
        };

        let user_id = row_text(&user, "id");
        match auth_tokens::issue(&self.tokens, &user_id, PASSWORD_RESET, self.config.security.reset_token_hours).await {
            Ok(token) => {
                let to = row_text(&user, "email");
                deliver("password_reset", &to, self.mailer.send_password_reset_email(&to, &token)).await;
            }
            Err(e) => tracing::error!(user_id = %user_id, "reset token not issued: {}", e),
        }
        Ok(())
    }

    pub async fn reset_password(&self, input: &Value) -> Result<(), ServiceError> {
        let record = RESET_PASSWORD.parse(input)?;
        let password = text(&record, "password");
        self.check_password_length(password)?;

        let user_id = auth_tokens::consume(&self.tokens, text(&record, "token"), PASSWORD_RESET)
            .await?
            .ok_or_else(|| ServiceError::BadRequest(INVALID_TOKEN.to_string()))?;

        let password_hash = hash_password(password).map_err(|e| internal("Password hashing failed", e))?;
        let mut patch = Row::new();
        patch.insert("password_hash".to_string(), Value::String(password_hash));
        self.users.update(&user_id, patch).await.map_err(|e| {
            if e.is_no_rows() {
                ServiceError::BadRequest(INVALID_TOKEN.to_string())
            } else {
                ServiceError::Store(e)
            }
        })?;

        tracing::info!(user_id = %user_id, "password reset");
        Ok(())
    }

    /// The caller's own user record.
    pub async fn session(&self, caller: &AuthContext) -> Result<Value, ServiceError> {
        let user = self.users.find_by_id(&caller.user_id.to_string(), &[]).await.map_err(|e| {
            if e.is_no_rows() {
                ServiceError::not_found("User")
            } else {
                ServiceError::Store(e)
            }
        })?;
        Ok(to_api(users::public_view(user)))
    }
}
