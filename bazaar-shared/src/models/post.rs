/// Post model and database operations
///
/// A post is a listing published by a user (its buyer). Posts are deleted
/// together with their buyer, and other users can favorite them through
/// the `posts_users` join table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE posts (
///     id BIGSERIAL PRIMARY KEY,
///     buyer_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     content TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE posts_users (
///     post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (post_id, user_id)
/// );
/// ```

use crate::error::{ModelError, ModelResult};
use crate::validation::{self, validate_present};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

pub(crate) const POST_COLUMNS: &str = "id, buyer_id, title, content, created_at, updated_at";

/// A published post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,

    /// Author of the post
    pub buyer_id: i64,

    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPost {
    #[validate(custom(function = "validate_present"), length(max = 255))]
    pub title: String,

    #[serde(default)]
    pub content: String,
}

impl Post {
    /// Creates a post authored by `buyer_id`
    ///
    /// # Errors
    ///
    /// `ModelError::Validation` for a blank or oversized title.
    pub async fn create(pool: &PgPool, buyer_id: i64, data: NewPost) -> ModelResult<Self> {
        validation::check(&data).map_err(ModelError::Validation)?;

        let query = format!(
            "INSERT INTO posts (buyer_id, title, content) VALUES ($1, $2, $3) RETURNING {}",
            POST_COLUMNS
        );

        let post = sqlx::query_as::<_, Post>(&query)
            .bind(buyer_id)
            .bind(data.title)
            .bind(data.content)
            .fetch_one(pool)
            .await?;

        Ok(post)
    }

    /// Finds a post by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);

        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Posts of a buyer, newest first
    pub async fn list_by_buyer(
        pool: &PgPool,
        buyer_id: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM posts WHERE buyer_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
            POST_COLUMNS
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(buyer_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Deletes a post with its comments, favorites and notifications
    ///
    /// Returns true if the post existed.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_requires_title() {
        let post = NewPost {
            title: "  ".to_string(),
            content: String::new(),
        };
        let errors = validation::check(&post).unwrap_err();
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[0].message, "can't be blank");
    }

    #[test]
    fn test_new_post_content_defaults_to_empty() {
        let post: NewPost = serde_json::from_str(r#"{"title": "Bán xe đạp"}"#).unwrap();
        assert_eq!(post.content, "");
        assert!(validation::check(&post).is_ok());
    }
}
