//! Authentication gate for protected routes.
//!
//! Runs before every protected handler: extracts the bearer credential
//! (`accessToken` cookie first, `Authorization: Bearer` header as fallback),
//! verifies it in the access-secret domain, resolves the identity from the
//! store, and attaches the stripped profile to the request. Any failure
//! short-circuits with 401 before the handler runs.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::database::models::UserProfile;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// The authenticated identity, attached to request extensions by the gate.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

/// Authentication middleware for protected routes.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_credential(&jar, request.headers())
        .ok_or_else(|| ApiError::unauthorized("No access token presented"))?;

    let claims = state
        .token_service
        .verify_access_token(&token)
        .map_err(|e| {
            debug!(error = %e, "Access token rejected");
            ApiError::unauthorized("Invalid access token")
        })?;

    let user = state
        .users
        .find_by_id(&claims.sub)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "User lookup failed during authentication");
            ApiError::internal("Database error occurred")
        })?
        .ok_or_else(|| {
            debug!(user_id = %claims.sub, "Access token for unknown user");
            ApiError::unauthorized("Invalid access token")
        })?;

    request
        .extensions_mut()
        .insert(CurrentUser(UserProfile::from(&user)));

    Ok(next.run(request).await)
}

/// Extract the bearer credential: cookie first, header as fallback.
fn bearer_credential(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        let value = cookie.value();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    fn jar_with(name: &'static str, value: &'static str) -> CookieJar {
        CookieJar::new().add(Cookie::new(name, value))
    }

    fn headers_with_bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[test]
    fn test_cookie_credential() {
        let jar = jar_with(ACCESS_TOKEN_COOKIE, "cookie-token");
        let token = bearer_credential(&jar, &HeaderMap::new());
        assert_eq!(token.as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_header_credential() {
        let token = bearer_credential(&CookieJar::new(), &headers_with_bearer("header-token"));
        assert_eq!(token.as_deref(), Some("header-token"));
    }

    #[test]
    fn test_cookie_checked_before_header() {
        let jar = jar_with(ACCESS_TOKEN_COOKIE, "cookie-token");
        let token = bearer_credential(&jar, &headers_with_bearer("header-token"));
        assert_eq!(token.as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_empty_cookie_falls_back_to_header() {
        let jar = jar_with(ACCESS_TOKEN_COOKIE, "");
        let token = bearer_credential(&jar, &headers_with_bearer("header-token"));
        assert_eq!(token.as_deref(), Some("header-token"));
    }

    #[test]
    fn test_no_credential() {
        assert!(bearer_credential(&CookieJar::new(), &HeaderMap::new()).is_none());
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(bearer_credential(&CookieJar::new(), &headers).is_none());
    }
}
