/// Notification model and database operations
///
/// Notifications tell a user that someone commented on one of their posts.
/// A notification is identified by `(user, post, commenter, content,
/// comment)`; a unique index on those columns makes creation idempotent.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
///     commenter_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     comment_id BIGINT REFERENCES comments(id) ON DELETE CASCADE,
///     read_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX notifications_identity_key ON notifications (
///     user_id, post_id, commenter_id, md5(content), COALESCE(comment_id, 0)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, post_id, commenter_id, content, comment_id, read_at, created_at, updated_at";

/// Number of notifications returned by [`Notification::list_recent`]
pub const RECENT_LIMIT: i64 = 15;

/// A notification addressed to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,

    /// Recipient
    pub user_id: i64,

    /// Post the notification is about
    pub post_id: i64,

    /// User who triggered the notification
    pub commenter_id: i64,

    pub content: String,

    /// Comment that triggered the notification, if any
    pub comment_id: Option<i64>,

    /// When the recipient read it (`None` while unread)
    pub read_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields identifying a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationKey {
    pub user_id: i64,
    pub post_id: i64,
    pub commenter_id: i64,
    pub content: String,
    pub comment_id: Option<i64>,
}

impl Notification {
    /// Returns the notification matching `key`, creating it if missing
    ///
    /// Concurrent calls with the same key yield the same row.
    pub async fn find_or_create<'e, E>(executor: E, key: &NotificationKey) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        // The no-op update makes RETURNING yield the existing row on conflict
        let query = format!(
            r#"
            INSERT INTO notifications (user_id, post_id, commenter_id, content, comment_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, post_id, commenter_id, md5(content), COALESCE(comment_id, 0))
            DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(key.user_id)
            .bind(key.post_id)
            .bind(key.commenter_id)
            .bind(&key.content)
            .bind(key.comment_id)
            .fetch_one(executor)
            .await
    }

    /// The most recent notifications of a user, newest first
    pub async fn list_recent(
        pool: &PgPool,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Every notification of a user, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Marks one notification of `user_id` as read
    ///
    /// Already-read notifications keep their original `read_at`. Returns
    /// true if the user has a notification with this id.
    pub async fn mark_as_read<'e, E>(executor: E, id: i64, user_id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW()), updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Not read yet
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}
