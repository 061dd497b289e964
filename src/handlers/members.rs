//! `/api/project/:id/members` and `/api/milestone/:id/members`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use super::{json_body, record_id};
use crate::middleware::{require_permission, ApiResponse, ApiResult};
use crate::services::member_service::{Membership, MILESTONE_MEMBERSHIP, PROJECT_MEMBERSHIP};
use crate::services::MemberService;
use crate::state::AppState;

async fn list(kind: &'static Membership, state: AppState, headers: HeaderMap, parent: String) -> ApiResult<Vec<Value>> {
    require_permission(&state, &headers, &kind.permission("read")).await?;
    let parent = record_id(&parent, kind.label)?;

    let members = MemberService::new(kind, state.store.clone()).list(&parent).await?;
    Ok(ApiResponse::success(members))
}

async fn add(
    kind: &'static Membership,
    state: AppState,
    headers: HeaderMap,
    parent: String,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let caller = require_permission(&state, &headers, &kind.permission("write")).await?;
    let parent = record_id(&parent, kind.label)?;
    let input = json_body(body)?;

    let member = MemberService::new(kind, state.store.clone()).add(&parent, &input).await?;
    tracing::info!(parent = %parent, by = %caller.user_id, "{} member added", kind.label);
    Ok(ApiResponse::created(member))
}

async fn remove(
    kind: &'static Membership,
    state: AppState,
    headers: HeaderMap,
    parent: String,
    member: String,
) -> ApiResult<()> {
    let caller = require_permission(&state, &headers, &kind.permission("write")).await?;
    let parent = record_id(&parent, kind.label)?;
    let member = record_id(&member, "Member")?;

    MemberService::new(kind, state.store.clone()).remove(&parent, &member).await?;
    tracing::info!(parent = %parent, member = %member, by = %caller.user_id, "{} member removed", kind.label);
    Ok(ApiResponse::no_content())
}

pub async fn project_members_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Vec<Value>> {
    list(&PROJECT_MEMBERSHIP, state, headers, id).await
}

pub async fn project_members_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    add(&PROJECT_MEMBERSHIP, state, headers, id, body).await
}

pub async fn project_members_remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, member_id)): Path<(String, String)>,
) -> ApiResult<()> {
    remove(&PROJECT_MEMBERSHIP, state, headers, id, member_id).await
}

pub async fn milestone_members_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Vec<Value>> {
    list(&MILESTONE_MEMBERSHIP, state, headers, id).await
}

pub async fn milestone_members_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    add(&MILESTONE_MEMBERSHIP, state, headers, id, body).await
}

pub async fn milestone_members_remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, member_id)): Path<(String, String)>,
) -> ApiResult<()> {
    remove(&MILESTONE_MEMBERSHIP, state, headers, id, member_id).await
}
