//! Session management service.
//!
//! Owns the credential lifecycle: login, refresh-token rotation, logout,
//! and password changes. The users table is the single source of truth for
//! refresh-token validity: a refresh token is usable only while its SHA-256
//! digest matches the one stored on the user's record, and every rotation
//! overwrites that digest in one single-row write (last writer wins).

use std::sync::Arc;

use argon2::{
    Argon2, Params,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::database::models::{UserProfile, UserRecord};
use crate::database::repositories::UserRepository;

use super::tokens::{TokenError, TokenService};

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Minimum password length
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: 8,
        }
    }
}

impl AuthConfig {
    /// Validate password strength against the configured policy.
    pub fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.len() < self.min_password_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        if !password.chars().any(|c| c.is_alphabetic()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one letter".to_string(),
            ));
        }

        if !password.chars().any(|c| c.is_numeric()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one number".to_string(),
            ));
        }

        Ok(())
    }
}

/// Account and session errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("User does not exist")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Refresh token does not match the active session")]
    TokenReuse,

    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Media upload failed: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// An authenticated session: the stripped identity plus both tokens.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Session manager: orchestrates login/logout/refresh over the user store
/// and the token service.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            config,
        }
    }

    /// Hash a password using Argon2id with OWASP recommended parameters.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        // OWASP recommended parameters: m=19456 (19 MiB), t=2, p=1
        let params = Params::new(19456, 2, 1, None)
            .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash format: {}", e)))?;

        // Default Argon2 reads the parameters back from the hash itself
        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a refresh token using SHA-256. Only the digest is persisted.
    pub fn hash_refresh_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Authenticate a user with username or email plus password.
    pub async fn login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let username = normalize(username);
        let email = normalize(email);

        if username.is_none() && email.is_none() {
            return Err(AuthError::Validation(
                "Username or email is required".to_string(),
            ));
        }

        debug!(username = ?username, email = ?email, "Login attempt");

        let user = self
            .find_by_login(username.as_deref(), email.as_deref())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !Self::verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, username = %user.username, "Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let (access_token, refresh_token) = self.issue_session(&user).await?;

        info!(user_id = %user.id, username = %user.username, "Login successful");

        Ok(AuthSession {
            user: UserProfile::from(&user),
            access_token,
            refresh_token,
        })
    }

    /// Exchange a valid refresh token for a new token pair (rotation).
    pub async fn refresh(&self, presented: &str) -> Result<AuthSession, AuthError> {
        let presented = presented.trim();
        if presented.is_empty() {
            warn!("Empty refresh token presented");
            return Err(AuthError::InvalidToken);
        }

        let claims = self
            .tokens
            .verify_refresh_token(presented)
            .map_err(|e| match e {
                TokenError::Expired => {
                    debug!("Expired refresh token presented");
                    AuthError::TokenExpired
                }
                _ => {
                    debug!(error = %e, "Refresh token failed verification");
                    AuthError::InvalidToken
                }
            })?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "Refresh token for unknown user");
                AuthError::InvalidToken
            })?;

        // The stored digest is the sole revocation handle: a mismatch means
        // the token was rotated out or the user logged out.
        let presented_hash = Self::hash_refresh_token(presented);
        if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            warn!(
                user_id = %user.id,
                "Superseded or revoked refresh token presented (possible reuse)"
            );
            return Err(AuthError::TokenReuse);
        }

        let (access_token, refresh_token) = self.issue_session(&user).await?;

        info!(user_id = %user.id, "Token refresh succeeded (refresh token rotated)");

        Ok(AuthSession {
            user: UserProfile::from(&user),
            access_token,
            refresh_token,
        })
    }

    /// Invalidate the user's refresh token unconditionally.
    ///
    /// Outstanding access tokens stay usable until they expire; only the
    /// refresh token has server-side state to revoke.
    pub async fn logout(&self, user_id: &str) -> Result<(), AuthError> {
        self.users
            .update_refresh_token(user_id, None)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        info!(user_id = %user_id, "Logout successful (refresh token cleared)");

        Ok(())
    }

    /// Change a user's password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        debug!(user_id = %user_id, "Password change attempt");

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if !Self::verify_password(current_password, &user.password_hash)? {
            warn!(user_id = %user_id, "Password change failed: incorrect current password");
            return Err(AuthError::IncorrectCurrentPassword);
        }

        self.config.validate_password(new_password)?;

        let new_hash = Self::hash_password(new_password)?;
        self.users
            .update_password(user_id, &new_hash)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        info!(user_id = %user_id, "Password changed");

        Ok(())
    }

    /// Issue a fresh access/refresh pair and persist the refresh digest.
    ///
    /// The single point of refresh-token mutation: one UPDATE of one row,
    /// so concurrent logins/refreshes for the same user resolve to whichever
    /// write lands last.
    async fn issue_session(&self, user: &UserRecord) -> Result<(String, String), AuthError> {
        let access_token = self
            .tokens
            .issue_access_token(&user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(&user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let refresh_hash = Self::hash_refresh_token(&refresh_token);
        self.users
            .update_refresh_token(&user.id, Some(&refresh_hash))
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok((access_token, refresh_token))
    }

    async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRecord>, AuthError> {
        if let Some(username) = username {
            let found = self
                .users
                .find_by_username(username)
                .await
                .map_err(|e| AuthError::Database(e.to_string()))?;
            if found.is_some() {
                return Ok(found);
            }
        }
        if let Some(email) = email {
            return self
                .users
                .find_by_email(email)
                .await
                .map_err(|e| AuthError::Database(e.to_string()));
        }
        Ok(None)
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory user repository shared by service tests.

    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        users: Mutex<HashMap<String, UserRecord>>,
    }

    impl InMemoryUserRepository {
        pub async fn get(&self, id: &str) -> Option<UserRecord> {
            self.users.lock().await.get(id).cloned()
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn create(&self, user: &UserRecord) -> crate::Result<()> {
            self.users
                .lock()
                .await
                .insert(user.id.clone(), user.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &str) -> crate::Result<Option<UserRecord>> {
            Ok(self.users.lock().await.get(id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> crate::Result<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> crate::Result<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn update_refresh_token(
            &self,
            id: &str,
            refresh_token_hash: Option<&str>,
        ) -> crate::Result<()> {
            if let Some(user) = self.users.lock().await.get_mut(id) {
                user.refresh_token_hash = refresh_token_hash.map(str::to_owned);
                user.updated_at = crate::database::time::now_ms();
            }
            Ok(())
        }

        async fn update_password(&self, id: &str, password_hash: &str) -> crate::Result<()> {
            if let Some(user) = self.users.lock().await.get_mut(id) {
                user.password_hash = password_hash.to_string();
                user.updated_at = crate::database::time::now_ms();
            }
            Ok(())
        }

        async fn delete(&self, id: &str) -> crate::Result<()> {
            self.users.lock().await.remove(id);
            Ok(())
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Argon2id hashing is deliberately slow; keep the case count small.
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_password_hash_verifies_only_original(
            password in "[a-zA-Z0-9!@#$%^&*]{8,32}",
            other in "[a-zA-Z0-9!@#$%^&*]{8,32}",
        ) {
            let hash = AuthService::hash_password(&password)
                .expect("Hashing should succeed");

            prop_assert!(hash.starts_with("$argon2id$"));
            prop_assert!(AuthService::verify_password(&password, &hash).unwrap());

            if password != other {
                prop_assert!(!AuthService::verify_password(&other, &hash).unwrap());
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_refresh_token_digest_is_stable_hex(token in "[a-zA-Z0-9._-]{16,256}") {
            let digest = AuthService::hash_refresh_token(&token);
            prop_assert_eq!(digest.len(), 64);
            prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
            prop_assert_eq!(digest, AuthService::hash_refresh_token(&token));
        }
    }
}
