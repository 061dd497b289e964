//! Router assembly.

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{auth, members, resource, system, users};
use crate::services::{
    ClientService, CommunicationLogService, CompanyService, EmployeeService, MilestoneService, PaymentService,
    ProjectService, ResourceService,
};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);
    let request_logging = state.config.server.enable_request_logging;

    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(auth_routes())
        // Protected
        .merge(resource_routes::<ClientService>("client"))
        .merge(resource_routes::<CompanyService>("company"))
        .merge(resource_routes::<EmployeeService>("employee"))
        .merge(resource_routes::<ProjectService>("project"))
        .merge(resource_routes::<MilestoneService>("milestone"))
        .merge(resource_routes::<PaymentService>("payment"))
        .merge(resource_routes::<CommunicationLogService>("communication-log"))
        .merge(member_routes())
        .merge(user_routes())
        .with_state(state)
        .layer(cors);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify-email", post(auth::verify_email))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/session", get(auth::session))
}

fn resource_routes<S: ResourceService>(path: &str) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/api/{}", path),
            get(resource::list::<S>).post(resource::create::<S>),
        )
        .route(
            &format!("/api/{}/:id", path),
            get(resource::get::<S>)
                .patch(resource::update::<S>)
                .delete(resource::delete::<S>),
        )
}

fn member_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route(
            "/api/project/:id/members",
            get(members::project_members_list).post(members::project_members_add),
        )
        .route("/api/project/:id/members/:member_id", delete(members::project_members_remove))
        .route(
            "/api/milestone/:id/members",
            get(members::milestone_members_list).post(members::milestone_members_add),
        )
        .route("/api/milestone/:id/members/:member_id", delete(members::milestone_members_remove))
}

fn user_routes() -> Router<AppState> {
    use axum::routing::patch;

    Router::new()
        .route("/api/users", get(users::list).post(users::invite))
        .route("/api/users/:id", patch(users::update))
}

/// `*` (or no origins at all) allows any origin.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
