//! Account operations: registration and profile queries.

use std::sync::Arc;

use tracing::{info, warn};

use crate::database::models::{UserProfile, UserRecord};
use crate::database::repositories::UserRepository;
use crate::media::{MediaStorage, MediaUpload};

use super::auth_service::{AuthConfig, AuthError, AuthService};

/// Registration input assembled from the multipart form.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<MediaUpload>,
    pub cover_image: Option<MediaUpload>,
}

/// Account service built atop the user store and the media collaborator.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    media: Arc<dyn MediaStorage>,
    config: AuthConfig,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        media: Arc<dyn MediaStorage>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            media,
            config,
        }
    }

    /// Register a new account.
    ///
    /// Validates the text fields, checks username/email uniqueness, delegates
    /// the avatar (required) and cover image (optional) to the asset host,
    /// then creates the record and returns it stripped of credential fields.
    pub async fn register(&self, account: NewAccount) -> Result<UserProfile, AuthError> {
        if [
            &account.full_name,
            &account.username,
            &account.email,
            &account.password,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
        {
            return Err(AuthError::Validation("All fields are required".to_string()));
        }

        self.config.validate_password(&account.password)?;

        let username = account.username.trim().to_lowercase();
        let email = account.email.trim().to_lowercase();

        if self
            .users
            .find_by_username(&username)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .is_some()
        {
            return Err(AuthError::Conflict("Username already taken".to_string()));
        }
        if self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .is_some()
        {
            return Err(AuthError::Conflict("Email already registered".to_string()));
        }

        let avatar = account
            .avatar
            .ok_or_else(|| AuthError::Validation("Avatar file is required".to_string()))?;
        let avatar_asset = self
            .media
            .upload(&avatar)
            .await
            .map_err(|e| AuthError::Upload(e.to_string()))?;

        // The cover image is optional; a failed upload downgrades to "absent"
        // rather than failing the registration.
        let cover_image_url = match account.cover_image {
            Some(cover) => match self.media.upload(&cover).await {
                Ok(asset) => Some(asset.url),
                Err(e) => {
                    warn!(error = %e, username = %username, "Cover image upload failed; registering without one");
                    None
                }
            },
            None => None,
        };

        let password_hash = AuthService::hash_password(&account.password)?;
        let user = UserRecord::new(
            username,
            email,
            account.full_name.trim(),
            password_hash,
            avatar_asset.url,
            cover_image_url,
        );

        self.users.create(&user).await.map_err(|e| match e {
            // Pre-checks race with concurrent registrations; surface the
            // store's uniqueness verdict as the same conflict.
            crate::Error::DatabaseSqlx(sqlx::Error::Database(db))
                if db.is_unique_violation() =>
            {
                AuthError::Conflict("Username or email already registered".to_string())
            }
            other => AuthError::Database(other.to_string()),
        })?;

        info!(user_id = %user.id, username = %user.username, "Account registered");

        Ok(UserProfile::from(&user))
    }

    /// Look up a channel's public profile by username.
    pub async fn channel_profile(&self, username: &str) -> Result<UserProfile, AuthError> {
        let username = username.trim().to_lowercase();
        let user = self
            .users
            .find_by_username(&username)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserProfile::from(&user))
    }
}
