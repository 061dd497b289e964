use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema};

pub const ROLES: &[&str] = &["admin", "manager", "employee", "viewer"];

/// Minimum password length accepted by signup and reset. The configured
/// minimum may be stricter; see `SecurityConfig::min_password_length`.
pub const MIN_PASSWORD_LENGTH: f64 = 8.0;

pub static SIGNUP: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "signup",
        vec![
            Field::email("email").message("Invalid email address"),
            Field::text("password")
                .min(MIN_PASSWORD_LENGTH)
                .message("Password must be at least 8 characters"),
            Field::text("name").min(2.0).message("Name must be at least 2 characters"),
        ],
    )
});

pub static LOGIN: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "login",
        vec![
            Field::email("email").message("Invalid email address"),
            Field::text("password").min(1.0).message("Password is required"),
        ],
    )
});

pub static FORGOT_PASSWORD: Lazy<Schema> = Lazy::new(|| {
    Schema::new("forgot_password", vec![Field::email("email").message("Invalid email address")])
});

pub static RESET_PASSWORD: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "reset_password",
        vec![
            Field::text("token").min(1.0).message("Token is required"),
            Field::text("password")
                .min(MIN_PASSWORD_LENGTH)
                .message("Password must be at least 8 characters"),
        ],
    )
});

pub static VERIFY_EMAIL: Lazy<Schema> = Lazy::new(|| {
    Schema::new("verify_email", vec![Field::text("token").min(1.0).message("Token is required")])
});

pub static INVITE_USER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "invite_user",
        vec![
            Field::email("email").message("Invalid email address"),
            Field::text("name").min(2.0).message("Name must be at least 2 characters"),
            Field::one_of("role", ROLES).default("employee"),
        ],
    )
});

pub static UPDATE_USER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "update_user",
        vec![
            Field::text("name").min(2.0).message("Name must be at least 2 characters"),
            Field::one_of("role", ROLES),
            Field::boolean("isActive"),
        ],
    )
    .partial(PartialDefaults::Skip)
});
