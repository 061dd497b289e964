//! Generic CRUD handlers, instantiated once per resource service:
//!
//! ```text
//! GET    /api/<resource>        list      <permission>:read
//! GET    /api/<resource>/:id    get       <permission>:read
//! POST   /api/<resource>        create    <permission>:write
//! PATCH  /api/<resource>/:id    update    <permission>:write
//! DELETE /api/<resource>/:id    delete    <permission>:delete
//! ```

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
use crate::services::{ListQuery, ResourceService};
use crate::state::AppState;

pub async fn list<S: ResourceService>(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<PaginatedResponse, ApiError> {
    let service = S::from_state(&state);
    let caller = require_permission(&state, &headers, &service.resource().permission("read")).await?;

    let query = ListQuery::from_params(query_params(query)?);
    let pagination = query.pagination;
    let listing = service.list(query, &caller).await?;

    Ok(build_paginated_response(
        listing.data,
        pagination.page,
        pagination.page_size,
        listing.total,
        listing.metadata,
    ))
}

pub async fn get<S: ResourceService>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let service = S::from_state(&state);
    let caller = require_permission(&state, &headers, &service.resource().permission("read")).await?;
    let id = record_id(&id, service.resource().label)?;

    Ok(ApiResponse::success(service.get(&id, &caller).await?))
}

pub async fn create<S: ResourceService>(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let service = S::from_state(&state);
    let caller = require_permission(&state, &headers, &service.resource().permission("write")).await?;
    let input = json_body(body)?;

    Ok(ApiResponse::created(service.create(input, &caller).await?))
}

pub async fn update<S: ResourceService>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let service = S::from_state(&state);
    let caller = require_permission(&state, &headers, &service.resource().permission("write")).await?;
    let id = record_id(&id, service.resource().label)?;
    let input = json_body(body)?;

    Ok(ApiResponse::success(service.update(&id, input, &caller).await?))
}

pub async fn delete<S: ResourceService>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let service = S::from_state(&state);
    let caller = require_permission(&state, &headers, &service.resource().permission("delete")).await?;
    let id = record_id(&id, service.resource().label)?;

    service.delete(&id, &caller).await?;
    Ok(ApiResponse::no_content())
}
