//! API route modules.
//!
//! Organizes routes by resource type.

pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/users", users::router(state.clone()))
        .nest("/health", health::router())
        .with_state(state)
}
