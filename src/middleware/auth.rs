//! Request gates. Each `require_*` resolves the caller or returns the
//! [`ApiError`] the handler must return unchanged.

use axum::http::HeaderMap;

use crate::auth::{has_permission, is_admin, is_admin_or_manager, validate_jwt, AuthContext, Role};
use crate::database::value_text;
use crate::error::ApiError;
use crate::repositories::{users, Repository};
use crate::state::AppState;

/// Resolve the bearer token to an active user.
///
/// 401 without a valid token, 404 when the user row is gone, 403 when the
/// account is deactivated.
pub async fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(|msg| {
        tracing::warn!("authentication failed: {}", msg);
        ApiError::unauthorized(msg)
    })?;

    let claims = validate_jwt(&token, &state.config.security).map_err(|e| {
        tracing::warn!("authentication failed: {}", e);
        ApiError::unauthorized("Invalid or expired session")
    })?;

    let repo = Repository::new(state.store.clone(), users::TABLE);
    let user = match repo.find_by_id(&claims.sub.to_string(), &[]).await {
        Ok(user) => user,
        Err(e) if e.is_no_rows() => {
            tracing::warn!(user_id = %claims.sub, "session for missing user");
            return Err(ApiError::not_found("User not found"));
        }
        Err(e) => {
            tracing::error!(code = %e.code, "user lookup failed: {}", e.message);
            return Err(ApiError::internal_server_error("An error occurred while processing your request"));
        }
    };

    if !users::is_active(&user) {
        tracing::warn!(user_id = %claims.sub, "deactivated account");
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    Ok(AuthContext {
        user_id: claims.sub,
        user_role: user.get("role").and_then(value_text).as_deref().and_then(Role::parse),
        user_email: user.get("email").and_then(value_text).unwrap_or(claims.email),
    })
}

pub async fn require_permission(
    state: &AppState,
    headers: &HeaderMap,
    permission: &str,
) -> Result<AuthContext, ApiError> {
    let caller = require_auth(state, headers).await?;
    if !has_permission(caller.user_role, permission) {
        tracing::warn!(user_id = %caller.user_id, permission, "permission denied");
        return Err(ApiError::forbidden(format!("Insufficient permissions: {} required", permission)));
    }
    Ok(caller)
}

pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
    let caller = require_auth(state, headers).await?;
    if !is_admin(caller.user_role) {
        tracing::warn!(user_id = %caller.user_id, "admin role required");
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(caller)
}

pub async fn require_admin_or_manager(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
    let caller = require_auth(state, headers).await?;
    if !is_admin_or_manager(caller.user_role) {
        tracing::warn!(user_id = %caller.user_id, "admin or manager role required");
        return Err(ApiError::forbidden("Admin or manager access required"));
    }
    Ok(caller)
}

pub async fn require_roles(state: &AppState, headers: &HeaderMap, roles: &[Role]) -> Result<AuthContext, ApiError> {
    let caller = require_auth(state, headers).await?;
    let allowed = caller.user_role.map(|role| roles.contains(&role)).unwrap_or(false);
    if !allowed {
        let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
        tracing::warn!(user_id = %caller.user_id, "role not in {:?}", names);
        return Err(ApiError::forbidden(format!("One of these roles is required: {}", names.join(", "))));
    }
    Ok(caller)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
