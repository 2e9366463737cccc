/// Profile model and database operations
///
/// Every user owns exactly one profile, created together with the user and
/// deleted with it. The profile holds links to the user's pages at the
/// identity providers they signed in with.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     fb_link VARCHAR(512),
///     gg_link VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX profiles_user_id_key ON profiles (user_id);
/// ```

use crate::auth::federated::ProfileLink;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

const PROFILE_COLUMNS: &str = "id, user_id, fb_link, gg_link, created_at, updated_at";

/// Profile of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,

    /// Owning user (unique)
    pub user_id: i64,

    /// Facebook profile URL
    pub fb_link: Option<String>,

    /// Google profile URL
    pub gg_link: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Creates the empty profile of a new user
    ///
    /// Takes any executor so it can run inside the transaction that
    /// inserts the user.
    pub async fn create_for_user<'e, E>(executor: E, user_id: i64) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO profiles (user_id) VALUES ($1) RETURNING {}",
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .fetch_one(executor)
            .await
    }

    /// Finds the profile of a user
    pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM profiles WHERE user_id = $1", PROFILE_COLUMNS);

        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Stores a provider profile link
    ///
    /// Writes `fb_link` or `gg_link` depending on `kind`. `None` clears the
    /// column. Returns `None` when the user has no profile.
    pub async fn update_links(
        pool: &PgPool,
        user_id: i64,
        kind: ProfileLink,
        link: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE profiles SET {} = $2, updated_at = NOW() WHERE user_id = $1 RETURNING {}",
            kind.column(),
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(link)
            .fetch_optional(pool)
            .await
    }

    /// Link stored for the given provider kind
    pub fn link(&self, kind: ProfileLink) -> Option<&str> {
        match kind {
            ProfileLink::Facebook => self.fb_link.as_deref(),
            ProfileLink::Google => self.gg_link.as_deref(),
        }
    }
}
