//! Authentication routes.
//!
//! Session endpoints: login, logout, token refresh, password change, and
//! the current-user query. Token cookies are HttpOnly + Secure on both set
//! and clear.

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::auth::{
    ACCESS_TOKEN_COOKIE, CurrentUser, REFRESH_TOKEN_COOKIE, require_auth,
};
use crate::api::server::AppState;
use crate::database::models::UserProfile;

/// Login request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username to authenticate with (username or email required)
    pub username: Option<String>,
    /// Email to authenticate with
    pub email: Option<String>,
    pub password: String,
}

/// Login response body: stripped identity plus both tokens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh request body; the cookie is checked first.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Refresh response body: the rotated token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Change password request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Create the auth router.
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .merge(protected)
}

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .build()
}

fn set_session_cookies(jar: CookieJar, access_token: &str, refresh_token: &str) -> CookieJar {
    jar.add(token_cookie(ACCESS_TOKEN_COOKIE, access_token.to_string()))
        .add(token_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token.to_string(),
        ))
}

fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(token_cookie(ACCESS_TOKEN_COOKIE, String::new()))
        .remove(token_cookie(REFRESH_TOKEN_COOKIE, String::new()))
}

/// POST /api/auth/login
///
/// Authenticate with username or email plus password; issues the token pair
/// as cookies and in the body.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let session = state
        .auth_service
        .login(
            request.username.as_deref(),
            request.email.as_deref(),
            &request.password,
        )
        .await?;

    let jar = set_session_cookies(jar, &session.access_token, &session.refresh_token);

    Ok((
        jar,
        Json(LoginResponse {
            user: session.user,
            access_token: session.access_token,
            refresh_token: session.refresh_token,
        }),
    ))
}

/// POST /api/auth/refresh-token
///
/// Exchange the refresh token (cookie or body) for a rotated pair.
/// The body is optional; the cookie is checked first.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: axum::body::Bytes,
) -> ApiResult<(CookieJar, Json<RefreshResponse>)> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .ok()
                .and_then(|request| request.refresh_token)
                .filter(|token| !token.is_empty())
        })
        .ok_or_else(|| ApiError::unauthorized("No refresh token presented"))?;

    let session = state.auth_service.refresh(&presented).await?;

    let jar = set_session_cookies(jar, &session.access_token, &session.refresh_token);

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
        }),
    ))
}

/// POST /api/auth/logout
///
/// Clear the stored refresh token and both cookies.
async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<serde_json::Value>)> {
    state.auth_service.logout(&user.id).await?;

    Ok((
        clear_session_cookies(jar),
        Json(serde_json::json!({ "success": true, "message": "Logged out" })),
    ))
}

/// POST /api/auth/change-password
async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .auth_service
        .change_password(&user.id, &request.old_password, &request.new_password)
        .await?;

    Ok(Json(
        serde_json::json!({ "success": true, "message": "Password changed" }),
    ))
}

/// GET /api/auth/current-user
async fn current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<UserProfile> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_deserialize() {
        let json = r#"{"username": "alice", "password": "secret"}"#;
        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username.as_deref(), Some("alice"));
        assert!(request.email.is_none());
        assert_eq!(request.password, "secret");
    }

    #[test]
    fn test_login_request_email_only() {
        let json = r#"{"email": "alice@example.com", "password": "secret"}"#;
        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert!(request.username.is_none());
        assert_eq!(request.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_refresh_request_uses_camel_case() {
        let json = r#"{"refreshToken": "abc123"}"#;
        let request: RefreshRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.refresh_token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_change_password_request_deserialize() {
        let json = r#"{"oldPassword": "old1234x", "newPassword": "new1234x"}"#;
        let request: ChangePasswordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.old_password, "old1234x");
        assert_eq!(request.new_password, "new1234x");
    }

    #[test]
    fn test_refresh_response_serializes_camel_case() {
        let response = RefreshResponse {
            access_token: "acc".to_string(),
            refresh_token: "ref".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("accessToken"));
        assert!(json.contains("refreshToken"));
    }

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = token_cookie(ACCESS_TOKEN_COOKIE, "value".to_string());
        assert!(cookie.http_only().unwrap_or(false));
        assert!(cookie.secure().unwrap_or(false));
        assert_eq!(cookie.path(), Some("/"));
    }
}
