//! Data access repositories.

pub mod user;

pub use user::{SqlxUserRepository, UserRepository};
