pub mod auth;
pub mod response;

pub use auth::{require_admin, require_admin_or_manager, require_auth, require_permission, require_roles};
pub use response::{ApiResponse, ApiResult};
