/// Endpoints of the signed-in user
///
/// All routes require an access token.
///
/// # Endpoints
///
/// - `GET /v1/me` - Account with profile links and unread count
/// - `PATCH /v1/me` - Change name or username
/// - `DELETE /v1/me` - Delete the account
/// - `PUT /v1/me/avatar` - Upload an avatar (multipart field `avatar`)
/// - `GET /v1/me/notifications` - Latest 15 notifications (`?all=true` for every one)
/// - `POST /v1/me/notifications/read` - Mark all as read
/// - `POST /v1/me/notifications/:id/read` - Mark one as read
/// - `GET /v1/me/favorites` - Favorited posts
/// - `PUT /v1/me/favorites/:post_id` - Favorite a post
/// - `DELETE /v1/me/favorites/:post_id` - Unfavorite a post

use super::users::{ProfileResponse, UserResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bazaar_shared::{
    auth::middleware::AuthContext,
    models::{Notification, Post, Profile, UpdateUser, User},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Multipart field carrying the avatar file
pub const AVATAR_FIELD: &str = "avatar";

/// The signed-in user's account
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,

    pub email: String,
    pub provider: Option<String>,
    pub sign_in_count: i32,
    pub current_sign_in_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub profile: Option<ProfileResponse>,
    pub unread_notifications: usize,
}

/// `?all=` query of the notification list
#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    /// Notifications that changed from unread to read
    pub marked: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub post_id: i64,
    pub favorite: bool,

    /// False when the post already was in the requested state
    pub changed: bool,
}

/// Loads the user behind the access token
///
/// A valid token for a deleted user is treated as unauthenticated.
pub(crate) async fn current_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))
}

async fn me_response(state: &AppState, user: &User) -> ApiResult<MeResponse> {
    let profile = Profile::find_by_user(&state.db, user.id).await?;
    let unread = user.unread_counter(&state.db).await?;

    Ok(MeResponse {
        user: UserResponse::new(user, &state.avatars),
        email: user.email.clone(),
        provider: user.provider.clone(),
        sign_in_count: user.sign_in_count,
        current_sign_in_at: user.current_sign_in_at,
        last_sign_in_at: user.last_sign_in_at,
        profile: profile.map(Into::into),
        unread_notifications: unread,
    })
}

pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<MeResponse>> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(me_response(&state, &user).await?))
}

/// Changes name and/or username
///
/// # Errors
///
/// - `422 Unprocessable Entity`: the resulting account is invalid, e.g. the
///   username is taken, malformed, or there is no avatar yet
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(changes): Json<UpdateUser>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::update(&state.db, auth.user_id, changes).await?;
    Ok(Json(me_response(&state, &user).await?))
}

/// Deletes the account with its posts, comments and notifications
pub async fn delete_me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<StatusCode> {
    if !User::delete(&state.db, &state.avatars, auth.user_id).await? {
        return Err(ApiError::Unauthorized("User no longer exists".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the avatar with the uploaded file
///
/// # Errors
///
/// - `400 Bad Request`: malformed multipart body
/// - `413 Payload Too Large`: file over the upload limit
/// - `422 Unprocessable Entity`: no `avatar` field, empty file, or an
///   extension other than png, jpg, jpeg or gif
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> ApiResult<Json<MeResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or(AVATAR_FIELD).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let user =
            User::replace_avatar(&state.db, &state.avatars, auth.user_id, &filename, &bytes)
                .await?;
        tracing::info!(user_id = user.id, size = bytes.len(), "Avatar updated");

        return Ok(Json(me_response(&state, &user).await?));
    }

    Err(ApiError::invalid(AVATAR_FIELD, "can't be blank"))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<NotificationsQuery>,
) -> ApiResult<Json<NotificationsResponse>> {
    let user = current_user(&state, &auth).await?;

    let notifications = if query.all {
        Notification::list_for_user(&state.db, user.id).await?
    } else {
        user.recent_notifications(&state.db).await?
    };
    let unread = user.unread_counter(&state.db).await?;

    Ok(Json(NotificationsResponse {
        notifications,
        unread,
    }))
}

pub async fn mark_notifications_read(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<MarkReadResponse>> {
    let user = current_user(&state, &auth).await?;
    let marked = user.mark_all_notifications_as_read(&state.db).await?;

    Ok(Json(MarkReadResponse { marked }))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Notification::mark_as_read(&state.db, id, auth.user_id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Post>>> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(user.favorites(&state.db).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(post_id): Path<i64>,
) -> ApiResult<Json<FavoriteResponse>> {
    let user = current_user(&state, &auth).await?;
    let changed = user.add_favorite(&state.db, post_id).await?;

    Ok(Json(FavoriteResponse {
        post_id,
        favorite: true,
        changed,
    }))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(post_id): Path<i64>,
) -> ApiResult<Json<FavoriteResponse>> {
    let user = current_user(&state, &auth).await?;
    let changed = user.remove_favorite(&state.db, post_id).await?;

    Ok(Json(FavoriteResponse {
        post_id,
        favorite: false,
        changed,
    }))
}
