//! Paired access/refresh token service.
//!
//! Both tokens are HS256 JWTs carrying the user id. The two kinds are
//! signed with independent secrets so that leaking one key cannot forge
//! tokens of the other kind, and a refresh token presented where an access
//! token is expected fails signature verification outright.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token claims structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID (subject)
    pub sub: String,
    /// Token ID. Makes every issuance distinct, so rotating a refresh
    /// token always changes the persisted digest even within one second.
    pub jti: String,
    /// Expiration timestamp (Unix)
    pub exp: u64,
    /// Issued at timestamp (Unix)
    pub iat: u64,
}

/// Token service error types.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token generation failed: {0}")]
    Generation(String),
    #[error("Token validation failed: {0}")]
    Validation(String),
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// Signing/verification settings for both token domains.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime in seconds (short: minutes).
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds (long: days).
    pub refresh_ttl_secs: u64,
}

struct SecretDomain {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl SecretDomain {
    fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }
}

/// Issues and verifies the paired access/refresh tokens.
pub struct TokenService {
    access: SecretDomain,
    refresh: SecretDomain,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: SecretDomain::new(&config.access_secret, config.access_ttl_secs),
            refresh: SecretDomain::new(&config.refresh_secret, config.refresh_ttl_secs),
        }
    }

    /// Issue a short-lived access token for a user.
    pub fn issue_access_token(&self, user_id: &str) -> Result<String, TokenError> {
        Self::issue(&self.access, user_id)
    }

    /// Issue a long-lived refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, TokenError> {
        Self::issue(&self.refresh, user_id)
    }

    /// Verify a token in the access-secret domain.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.access, token)
    }

    /// Verify a token in the refresh-secret domain.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        Self::verify(&self.refresh, token)
    }

    /// Access token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> u64 {
        self.access.ttl_secs
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh.ttl_secs
    }

    fn issue(domain: &SecretDomain, user_id: &str) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TokenError::Generation(e.to_string()))?
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            exp: now + domain.ttl_secs,
            iat: now,
        };

        encode(&Header::default(), &claims, &domain.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    fn verify(domain: &SecretDomain, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &domain.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::Invalid,
                _ => TokenError::Validation(e.to_string()),
            })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_secs", &self.access.ttl_secs)
            .field("refresh_ttl_secs", &self.refresh.ttl_secs)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_token_config() -> TokenConfig {
    TokenConfig {
        access_secret: "access-secret-key-32-chars-long!".to_string(),
        refresh_secret: "refresh-secret-key-32-chars-lng!".to_string(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 864_000,
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_round_trip_preserves_subject(user_id in "[a-zA-Z0-9_-]{1,50}") {
            let service = TokenService::new(&test_token_config());

            let token = service
                .issue_access_token(&user_id)
                .expect("Token generation should succeed");
            let claims = service
                .verify_access_token(&token)
                .expect("Token validation should succeed");

            prop_assert_eq!(&claims.sub, &user_id);
            prop_assert!(claims.exp > claims.iat);
        }

        #[test]
        fn prop_tampered_token_rejected(
            user_id in "[a-zA-Z0-9_-]{1,50}",
            tamper_char in prop::sample::select(vec!['X', 'Y', 'Z', '0', '1', '2']),
            tamper_pos in 10usize..50usize,
        ) {
            let service = TokenService::new(&test_token_config());
            let token = service.issue_access_token(&user_id).unwrap();

            let mut tampered: Vec<char> = token.chars().collect();
            if tamper_pos < tampered.len() {
                tampered[tamper_pos] = tamper_char;
            }
            let tampered: String = tampered.into_iter().collect();

            if tampered != token {
                prop_assert!(service.verify_access_token(&tampered).is_err());
            }
        }
    }
}
