//! User account routes: registration and channel profiles.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};

use crate::api::account_service::NewAccount;
use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::auth::require_auth;
use crate::api::server::AppState;
use crate::database::models::UserProfile;
use crate::media::MediaUpload;

/// Create the users router.
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/channel/{username}", get(channel_profile))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .merge(protected)
}

/// POST /api/users/register
///
/// Multipart form: `fullname`, `username`, `email`, `password`, `avatar`
/// (one file, required), `coverImage` (one file, optional).
async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let account = parse_registration_form(multipart).await?;
    let profile = state.account_service.register(account).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/users/channel/{username}
async fn channel_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.account_service.channel_profile(&username).await?;
    Ok(Json(profile))
}

async fn parse_registration_form(mut multipart: Multipart) -> Result<NewAccount, ApiError> {
    let mut account = NewAccount::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "fullname" => account.full_name = read_text(field, &name).await?,
            "username" => account.username = read_text(field, &name).await?,
            "email" => account.email = read_text(field, &name).await?,
            "password" => account.password = read_text(field, &name).await?,
            "avatar" => account.avatar = Some(read_file(field, &name).await?),
            "coverImage" => account.cover_image = Some(read_file(field, &name).await?),
            // Unknown parts are drained and ignored
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(account)
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Unreadable field '{name}': {e}")))
}

async fn read_file(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<MediaUpload, ApiError> {
    let file_name = field
        .file_name()
        .map(str::to_owned)
        .unwrap_or_else(|| name.to_string());
    let content_type = field
        .content_type()
        .map(str::to_owned)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Unreadable file '{name}': {e}")))?;

    Ok(MediaUpload {
        file_name,
        content_type,
        data,
    })
}
