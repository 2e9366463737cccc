/// Post and comment endpoints
///
/// # Endpoints
///
/// - `POST /v1/posts` - Publish a post (JWT)
/// - `GET /v1/posts/:id` - Show a post
/// - `DELETE /v1/posts/:id` - Delete a post (buyer or admin)
/// - `GET /v1/posts/:id/comments` - Comments, oldest first
/// - `POST /v1/posts/:id/comments` - Comment on a post; notifies the buyer (JWT)
/// - `DELETE /v1/comments/:id` - Delete a comment (author or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bazaar_shared::{
    auth::middleware::AuthContext,
    models::{Comment, NewComment, NewPost, Post},
};

/// Whether `auth` may remove a record owned by `owner_id`
pub fn can_manage(auth: &AuthContext, owner_id: i64) -> bool {
    auth.admin || auth.user_id == owner_id
}

pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(data): Json<NewPost>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = Post::create(&state.db, auth.user_id, data).await?;
    tracing::info!(post_id = post.id, buyer_id = auth.user_id, "Post created");

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Post>> {
    Ok(Json(find_post(&state, id).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let post = find_post(&state, id).await?;
    if !can_manage(&auth, post.buyer_id) {
        return Err(ApiError::Forbidden("Not the author of this post".to_string()));
    }

    Post::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Comment>>> {
    let post = find_post(&state, id).await?;
    Ok(Json(Comment::list_for_post(&state.db, post.id).await?))
}

/// Comments on a post
///
/// The post's buyer gets a notification unless they wrote the comment.
///
/// # Errors
///
/// - `404 Not Found`: no such post
/// - `422 Unprocessable Entity`: blank body
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(data): Json<NewComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = Comment::create(&state.db, id, auth.user_id, data).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    if !can_manage(&auth, comment.creator_id) {
        return Err(ApiError::Forbidden("Not the author of this comment".to_string()));
    }

    Comment::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_post(state: &AppState, id: i64) -> ApiResult<Post> {
    Post::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}
