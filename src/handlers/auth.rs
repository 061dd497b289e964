//! Public account endpoints under `/api/auth`, plus the session lookup.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use super::json_body;
use crate::middleware::{require_auth, ApiResponse, ApiResult};
use crate::services::AuthService;
use crate::state::AppState;

/// POST /api/auth/signup
pub async fn signup(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    let input = json_body(body)?;
    let user = AuthService::from_state(&state).signup(&input).await?;
    Ok(ApiResponse::created(user))
}

/// POST /api/auth/login
pub async fn login(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    let input = json_body(body)?;
    Ok(ApiResponse::success(AuthService::from_state(&state).login(&input).await?))
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let input = json_body(body)?;
    Ok(ApiResponse::success(AuthService::from_state(&state).verify_email(&input).await?))
}

/// POST /api/auth/forgot-password
///
/// The answer is the same whether or not the address has an account.
pub async fn forgot_password(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let input = json_body(body)?;
    AuthService::from_state(&state).forgot_password(&input).await?;
    Ok(ApiResponse::success(json!({
        "message": "If an account exists for that address, a reset link has been sent"
    })))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let input = json_body(body)?;
    AuthService::from_state(&state).reset_password(&input).await?;
    Ok(ApiResponse::success(json!({ "message": "Password has been reset" })))
}

/// GET /api/auth/session
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let caller = require_auth(&state, &headers).await?;
    Ok(ApiResponse::success(AuthService::from_state(&state).session(&caller).await?))
}
