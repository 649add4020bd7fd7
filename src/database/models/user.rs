//! User database model and its public projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User database model.
///
/// Carries the credential material (password hash, refresh-token digest).
/// It deliberately does not implement `Serialize`: the only shape that
/// leaves the process is [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    /// Unique identifier (UUID)
    pub id: String,
    /// Unique username, stored lower-cased
    pub username: String,
    /// Unique email address, stored lower-cased
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Argon2id password hash (PHC string)
    pub password_hash: String,
    /// Hosted avatar image URL
    pub avatar_url: String,
    /// Optional hosted cover image URL
    pub cover_image_url: Option<String>,
    /// SHA-256 hex digest of the single currently-valid refresh token.
    /// `None` means no active session; this column is the sole revocation
    /// handle for refresh tokens.
    pub refresh_token_hash: Option<String>,
    /// Unix epoch milliseconds (UTC) when the user was created.
    pub created_at: i64,
    /// Unix epoch milliseconds (UTC) when the user was last updated.
    pub updated_at: i64,
}

impl UserRecord {
    /// Create a new user record.
    /// Note: username/email must already be normalized and the password hashed.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        password_hash: impl Into<String>,
        avatar_url: impl Into<String>,
        cover_image_url: Option<String>,
    ) -> Self {
        let now = crate::database::time::now_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
            password_hash: password_hash.into(),
            avatar_url: avatar_url.into(),
            cover_image_url,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get created_at as `DateTime<Utc>`.
    pub fn get_created_at(&self) -> DateTime<Utc> {
        crate::database::time::ms_to_datetime(self.created_at)
    }
}

/// Public projection of a user record.
///
/// Excludes the password hash and refresh-token digest by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            username: record.username.clone(),
            email: record.email.clone(),
            full_name: record.full_name.clone(),
            avatar_url: record.avatar_url.clone(),
            cover_image_url: record.cover_image_url.clone(),
            created_at: record.get_created_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> UserRecord {
        UserRecord::new(
            "alice",
            "alice@example.com",
            "Alice Example",
            "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hashhashhash",
            "https://assets.example.com/avatar.png",
            None,
        )
    }

    #[test]
    fn test_new_record_defaults() {
        let user = sample_record();
        assert!(user.refresh_token_hash.is_none());
        assert_eq!(user.created_at, user.updated_at);
        assert!(uuid::Uuid::parse_str(&user.id).is_ok());
    }

    #[test]
    fn test_record_ids_unique() {
        assert_ne!(sample_record().id, sample_record().id);
    }

    #[test]
    fn test_profile_strips_credentials() {
        let mut user = sample_record();
        user.refresh_token_hash = Some("deadbeef".repeat(8));

        let profile = UserProfile::from(&user);
        let json = serde_json::to_string(&profile).unwrap();

        assert!(json.contains("alice"));
        assert!(!json.to_lowercase().contains("password"));
        assert!(!json.to_lowercase().contains("refresh"));
        assert!(!json.contains("deadbeef"));
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = UserProfile::from(&sample_record());
        let json = serde_json::to_string(&profile).unwrap();

        assert!(json.contains("fullName"));
        assert!(json.contains("avatarUrl"));
        // Absent cover image is omitted entirely
        assert!(!json.contains("coverImageUrl"));
    }
}
