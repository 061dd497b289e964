use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// API information and entry points
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "auth": "/api/auth/*",
            "users": "/api/users",
            "resources": [
                "/api/client",
                "/api/company",
                "/api/employee",
                "/api/project",
                "/api/milestone",
                "/api/payment",
                "/api/communication-log"
            ],
            "health": "/health"
        }
    }))
}

/// Liveness plus a store round-trip
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok", "timestamp": timestamp })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable", "timestamp": timestamp })),
            )
        }
    }
}
