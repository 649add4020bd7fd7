//! API error handling.
//!
//! Every failure is converted at the request boundary into a structured
//! `{ "success": false, "message": ... }` response with the mapped status;
//! nothing escapes as an unhandled fault.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::auth_service::AuthError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub message: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 401 Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Create a 409 Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::bad_request(msg),
            AuthError::WeakPassword(msg) => ApiError::bad_request(msg),
            AuthError::Upload(msg) => ApiError::bad_request(msg),
            AuthError::IncorrectCurrentPassword => {
                ApiError::bad_request("Current password is incorrect")
            }
            AuthError::Conflict(msg) => ApiError::conflict(msg),
            AuthError::UserNotFound => ApiError::not_found("User does not exist"),
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthError::InvalidToken => ApiError::unauthorized("Invalid token"),
            AuthError::TokenExpired => ApiError::unauthorized("Token has expired"),
            AuthError::TokenReuse => ApiError::unauthorized("Refresh token is no longer valid"),
            AuthError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ApiError::internal("Database error occurred")
            }
            AuthError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ApiError::internal("An unexpected error occurred")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let err = ApiError::not_found("User does not exist");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "User does not exist");
    }

    #[test]
    fn test_auth_error_mapping() {
        let cases = [
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::Conflict("x".into()), StatusCode::CONFLICT),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::TokenReuse, StatusCode::UNAUTHORIZED),
            (
                AuthError::IncorrectCurrentPassword,
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::Upload("x".into()), StatusCode::BAD_REQUEST),
            (
                AuthError::Database("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, expected);
        }
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_string(&ApiErrorResponse {
            success: false,
            message: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(body, r#"{"success":false,"message":"nope"}"#);
    }
}
