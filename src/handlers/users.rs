//! User administration: `/api/users`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

use super::{json_body, query_params, record_id};
use crate::error::ApiError;
use crate::middleware::{require_permission, ApiResponse, ApiResult};
use crate::pagination::{build_paginated_response, PaginatedResponse};
use crate::services::{ListQuery, UserService};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<PaginatedResponse, ApiError> {
    require_permission(&state, &headers, "users:read").await?;

    let query = ListQuery::from_params(query_params(query)?);
    let pagination = query.pagination;
    let listing = UserService::from_state(&state).list(query).await?;

    Ok(build_paginated_response(listing.data, pagination.page, pagination.page_size, listing.total, None))
}

/// POST /api/users invites a new account.
pub async fn invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let caller = require_permission(&state, &headers, "users:write").await?;
    let input = json_body(body)?;
    Ok(ApiResponse::created(UserService::from_state(&state).invite(&input, &caller).await?))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let caller = require_permission(&state, &headers, "users:write").await?;
    let id = record_id(&id, "User")?;
    let input = json_body(body)?;
    Ok(ApiResponse::success(UserService::from_state(&state).update(&id, &input, &caller).await?))
}
