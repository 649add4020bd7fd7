//! Database models.

pub mod user;

pub use user::{UserProfile, UserRecord};
