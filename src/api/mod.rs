//! REST API server module.
//!
//! HTTP endpoints for account registration, session management, and
//! profile queries.

pub mod account_service;
pub mod auth_service;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod tokens;

pub use server::ApiServer;
