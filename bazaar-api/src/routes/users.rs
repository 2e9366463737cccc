/// User directory endpoints
///
/// # Endpoints
///
/// - `GET /v1/users?page=` - Users, 10 per page, newest first
/// - `GET /v1/users/search?q=` - Users ranked by how many fields match
/// - `GET /v1/users/admins` - Administrators
/// - `GET /v1/users/:id` - One user with profile links
/// - `GET /v1/users/:id/posts/recent` - The user's 5 latest posts
/// - `DELETE /v1/users/:id` - Remove a user (admins only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bazaar_shared::{
    auth::middleware::AuthContext,
    models::{Post, Profile, User},
    storage::AvatarStore,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub name: String,

    /// Public URL of the avatar
    pub avatar_url: Option<String>,

    pub admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: &User, avatars: &AvatarStore) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar.as_deref().map(|path| avatars.url_for(path)),
            admin: user.admin,
            created_at: user.created_at,
        }
    }

    pub fn list(users: &[User], avatars: &AvatarStore) -> Vec<Self> {
        users.iter().map(|u| Self::new(u, avatars)).collect()
    }
}

/// Provider profile links
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub fb_link: Option<String>,
    pub gg_link: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            fb_link: profile.fb_link,
            gg_link: profile.gg_link,
        }
    }
}

/// A user with profile links
#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,

    pub profile: Option<ProfileResponse>,
}

/// `?page=` query, 1-based
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// One page of users
#[derive(Debug, Serialize)]
pub struct UserPageResponse {
    pub users: Vec<UserResponse>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// `?q=` query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Lists users page by page
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<UserPageResponse>> {
    let page = User::paginate(&state.db, query.page.unwrap_or(1)).await?;

    Ok(Json(UserPageResponse {
        users: UserResponse::list(&page.users, &state.avatars),
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        total_pages: page.total_pages,
    }))
}

/// Searches users by username, name and email
///
/// A one-character or blank query lists every user.
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = User::search(&state.db, &query.q).await?;
    Ok(Json(UserResponse::list(&users, &state.avatars)))
}

/// Lists administrators
pub async fn list_admins(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = User::admin_users(&state.db).await?;
    Ok(Json(UserResponse::list(&users, &state.avatars)))
}

/// Shows one user
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserDetailResponse>> {
    let user = find_user(&state, id).await?;
    let profile = Profile::find_by_user(&state.db, id).await?;

    Ok(Json(UserDetailResponse {
        user: UserResponse::new(&user, &state.avatars),
        profile: profile.map(Into::into),
    }))
}

/// The user's most recent posts
pub async fn recent_posts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Post>>> {
    let user = find_user(&state, id).await?;
    Ok(Json(user.recent_posts(&state.db).await?))
}

/// Deletes a user and everything it owns
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `404 Not Found`: no such user
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !auth.admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    if !User::delete(&state.db, &state.avatars, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(admin_id = auth.user_id, user_id = id, "Admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: &AppState, id: i64) -> ApiResult<User> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}
