pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod pagination;
pub mod repositories;
pub mod schema;
pub mod services;
pub mod state;
pub mod transform;

pub use app::app;
pub use state::AppState;
