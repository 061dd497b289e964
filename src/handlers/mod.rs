//! HTTP handlers. Each one authenticates first, then hands the request to a
//! service and wraps the outcome in the response envelope.

pub mod auth;
pub mod members;
pub mod resource;
pub mod system;
pub mod users;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// Unwrap a JSON body, turning a malformed payload into a 400.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("rejected request body: {}", rejection);
            Err(ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text())))
        }
    }
}

/// Unwrap a query string, turning a malformed one into a 400 with the
/// usual `{ error }` body.
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => {
            tracing::debug!("rejected query string: {}", rejection);
            Err(ApiError::bad_request(format!("Invalid query string: {}", rejection.body_text())))
        }
    }
}

/// Canonical form of a path id. Anything that is not a UUID cannot name a
/// record, so it is reported as `"<label> not found"`.
pub(crate) fn record_id(raw: &str, label: &str) -> Result<String, ApiError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::not_found(format!("{} not found", label)))
}
