// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::schema::Issue;
use crate::services::ServiceError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError { message: String, details: Vec<Issue> },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// `{ error }`, plus `details` for validation failures
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, details } => json!({
                "error": message,
                "details": details,
            }),
            _ => json!({ "error": self.message() }),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, details: Vec<Issue>) -> Self {
        ApiError::ValidationError { message: message.into(), details }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

/// Map a service failure to its HTTP form. Store and internal errors are
/// logged and replaced with a generic message.
pub fn handle_api_error(err: ServiceError) -> ApiError {
    match err {
        ServiceError::Validation(e) => ApiError::validation_error("Validation failed", e.issues),
        ServiceError::NotFound(_) => ApiError::not_found(err.to_string()),
        ServiceError::Conflict(msg) => ApiError::conflict(msg),
        ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
        ServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
        ServiceError::BadRequest(msg) => ApiError::bad_request(msg),
        ServiceError::Store(e) => {
            // Don't expose internal SQL errors to clients
            tracing::error!(code = %e.code, "store error: {}", e.message);
            ApiError::internal_server_error("An error occurred while processing your request")
        }
        ServiceError::Internal(msg) => {
            tracing::error!("internal error: {}", msg);
            ApiError::internal_server_error("An error occurred while processing your request")
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        handle_api_error(err)
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::StoreError;
    use crate::schema::ValidationError;

    #[test]
    fn not_found_keeps_resource_message() {
        let err = handle_api_error(ServiceError::not_found("Client"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_json(), json!({ "error": "Client not found" }));
    }

    #[test]
    fn validation_carries_details() {
        let err = handle_api_error(ValidationError::single("name", "Too short").into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_json();
        assert_eq!(body["details"][0]["path"], json!(["name"]));
        assert_eq!(body["details"][0]["message"], "Too short");
    }

    #[test]
    fn store_errors_are_not_leaked() {
        let err = handle_api_error(ServiceError::Store(StoreError::new("XX000", "relation \"secret\" does not exist")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_json().to_string().contains("secret"));
    }

    #[test]
    fn statuses() {
        assert_eq!(handle_api_error(ServiceError::Conflict("x".into())).status_code(), StatusCode::CONFLICT);
        assert_eq!(handle_api_error(ServiceError::Forbidden("x".into())).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(handle_api_error(ServiceError::Unauthorized("x".into())).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(handle_api_error(ServiceError::BadRequest("x".into())).status_code(), StatusCode::BAD_REQUEST);
    }
}
