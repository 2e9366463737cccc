/// Comment model and database operations
///
/// Users comment on posts. A new comment notifies the post's buyer unless
/// the buyer wrote it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id BIGSERIAL PRIMARY KEY,
///     post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
///     creator_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     body TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use super::notification::{Notification, NotificationKey};
use crate::error::{ModelError, ModelResult};
use crate::validation::{self, validate_present};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use validator::Validate;

const COMMENT_COLUMNS: &str = "id, post_id, creator_id, body, created_at, updated_at";

/// Notification text sent to a post's buyer for a new comment
pub const COMMENT_NOTIFICATION: &str = "đã bình luận về bài đăng của bạn";

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,

    /// Author of the comment
    pub creator_id: i64,

    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for commenting on a post
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewComment {
    #[validate(custom(function = "validate_present"), length(max = 5000))]
    pub body: String,
}

/// Recipient of the notification for a comment, if anyone should get one
pub fn notification_recipient(buyer_id: i64, creator_id: i64) -> Option<i64> {
    (buyer_id != creator_id).then_some(buyer_id)
}

impl Comment {
    /// Adds a comment to a post and notifies the post's buyer
    ///
    /// The comment and the notification are written in one transaction.
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` for a blank body
    /// - `ModelError::NotFound` if the post does not exist
    pub async fn create(
        pool: &PgPool,
        post_id: i64,
        creator_id: i64,
        data: NewComment,
    ) -> ModelResult<Self> {
        validation::check(&data).map_err(ModelError::Validation)?;

        let mut tx = pool.begin().await?;

        let buyer_id: i64 = sqlx::query_scalar("SELECT buyer_id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ModelError::NotFound("Post"))?;

        let query = format!(
            "INSERT INTO comments (post_id, creator_id, body) VALUES ($1, $2, $3) RETURNING {}",
            COMMENT_COLUMNS
        );
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .bind(creator_id)
            .bind(data.body)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(recipient) = notification_recipient(buyer_id, creator_id) {
            let key = NotificationKey {
                user_id: recipient,
                post_id,
                commenter_id: creator_id,
                content: COMMENT_NOTIFICATION.to_string(),
                comment_id: Some(comment.id),
            };
            Notification::find_or_create(&mut *tx, &key).await?;
            debug!(post_id, recipient, "Notified buyer of new comment");
        }

        tx.commit().await?;
        Ok(comment)
    }

    /// Comments on a post, oldest first
    pub async fn list_for_post(pool: &PgPool, post_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM comments WHERE post_id = $1 ORDER BY created_at, id",
            COMMENT_COLUMNS
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }

    /// Finds a comment by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);

        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a comment and the notifications it triggered
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
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
    fn test_buyer_is_not_notified_of_own_comment() {
        assert_eq!(notification_recipient(1, 1), None);
        assert_eq!(notification_recipient(1, 2), Some(1));
    }

    #[test]
    fn test_blank_comment_rejected() {
        let errors = validation::check(&NewComment {
            body: "\n".to_string(),
        })
        .unwrap_err();
        assert_eq!(errors[0].field, "body");
    }
}
