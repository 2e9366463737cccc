/// User model and database operations
///
/// Users sign in through an identity provider (Facebook, Google) and never
/// hold a local password. A user owns one profile, publishes posts (as
/// their buyer), favorites other posts, comments, and receives
/// notifications.
///
/// # Lifecycle
///
/// - Created by [`User::create`] or [`User::from_federated`]. The username
///   is never supplied: it is `"user{id}"`, assigned in the same statement
///   that inserts the row. The empty profile is created in the same
///   transaction.
/// - Edited by [`User::update`] and [`User::set_avatar`], which run the
///   update-time validation rules (username format and uniqueness, avatar
///   extension).
/// - Deleted by [`User::delete`]; the database cascades to the profile,
///   posts, favorites, comments and notifications.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     email CITEXT NOT NULL,
///     provider VARCHAR(64),
///     uid VARCHAR(255),
///     name VARCHAR(255) NOT NULL,
///     username VARCHAR(255) NOT NULL,
///     avatar VARCHAR(512),
///     admin BOOLEAN NOT NULL DEFAULT FALSE,
///     sign_in_count INTEGER NOT NULL DEFAULT 0,
///     current_sign_in_at TIMESTAMPTZ,
///     last_sign_in_at TIMESTAMPTZ,
///     current_sign_in_ip VARCHAR(64),
///     last_sign_in_ip VARCHAR(64),
///     remember_created_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX users_email_key ON users (email);
/// CREATE UNIQUE INDEX users_username_lower_key ON users (lower(username));
/// CREATE UNIQUE INDEX users_provider_uid_key ON users (provider, uid);
/// ```
///
/// # Example
///
/// ```no_run
/// use bazaar_shared::db::{create_pool, DatabaseConfig};
/// use bazaar_shared::models::user::{NewUser, User};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///
/// let user = User::create(&pool, NewUser::new("an@example.com", "Nguyễn An")).await?;
/// assert_eq!(user.username, format!("user{}", user.id));
///
/// let ranked = User::search(&pool, "@nguyen an").await?;
/// # Ok(())
/// # }
/// ```

use super::notification::{Notification, NotificationKey, RECENT_LIMIT};
use super::post::{Post, POST_COLUMNS};
use super::profile::Profile;
use crate::auth::federated::FederatedAuth;
use crate::error::{FieldError, ModelError, ModelResult};
use crate::search::{contains_pattern, rank_by_frequency, SearchTerms};
use crate::storage::AvatarStore;
use crate::validation::{self, NewUserCheck, UserUpdateCheck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info, warn};

/// Users per page in [`User::paginate`]
pub const PER_PAGE: i64 = 10;

/// Posts returned by [`User::recent_posts`]
pub const RECENT_POSTS_LIMIT: i64 = 5;

/// Message for a username another user already has
pub const USERNAME_TAKEN_MESSAGE: &str = "has already been taken";

// CITEXT is read back as TEXT
const USER_COLUMNS: &str = "users.id, users.email::text AS email, users.provider, users.uid, \
    users.name, users.username, users.avatar, users.admin, users.sign_in_count, \
    users.current_sign_in_at, users.last_sign_in_at, users.current_sign_in_ip, \
    users.last_sign_in_ip, users.remember_created_at, users.created_at, users.updated_at";

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Email address (unique, case-insensitive)
    pub email: String,

    /// Identity provider the user signed up with
    pub provider: Option<String>,

    /// User id at `provider`
    pub uid: Option<String>,

    /// Display name
    pub name: String,

    /// Handle, `"user{id}"` until the user changes it
    pub username: String,

    /// Stored avatar path, relative to the avatar store root
    pub avatar: Option<String>,

    pub admin: bool,

    /// Number of sign-ins
    pub sign_in_count: i32,
    pub current_sign_in_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub current_sign_in_ip: Option<String>,
    pub last_sign_in_ip: Option<String>,

    /// Set while a remember-me cookie is outstanding
    pub remember_created_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub provider: Option<String>,
    pub uid: Option<String>,
    pub avatar: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Changes to an existing user
///
/// Only `Some` fields are changed. Validation runs on the resulting record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub username: Option<String>,
}

/// One page of users
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,

    /// 1-based page number
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Username assigned to a newly created user
pub fn default_username(id: i64) -> String {
    format!("user{}", id)
}

/// Row offset of a 1-based page; pages below 1 are treated as page 1
pub fn page_offset(page: i64) -> i64 {
    (page.max(1) - 1) * PER_PAGE
}

fn total_pages(total: i64) -> i64 {
    (total + PER_PAGE - 1) / PER_PAGE
}

/// Field errors of the update-time rules plus the uniqueness result,
/// ordered by field
fn update_errors(candidate: &UserUpdateCheck, username_taken: bool) -> Vec<FieldError> {
    let mut errors = validation::check(candidate).err().unwrap_or_default();
    if username_taken {
        errors.push(FieldError::new("username", USERNAME_TAKEN_MESSAGE));
    }
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    errors
}

fn is_provider_conflict(err: &ModelError) -> bool {
    match err {
        ModelError::Database(sqlx::Error::Database(db)) => {
            db.constraint() == Some("users_provider_uid_key")
        }
        _ => false,
    }
}

impl User {
    /// Creates a user with its profile
    ///
    /// Inserts the row with `username = "user{id}"` and the empty profile
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` if the name is blank, shorter than 2 or
    ///   longer than 45 characters, or the email is malformed
    /// - `ModelError::Database` if the email or provider identity is
    ///   already taken
    pub async fn create(pool: &PgPool, data: NewUser) -> ModelResult<Self> {
        let check = NewUserCheck {
            name: data.name.clone(),
            email: data.email.clone(),
        };
        validation::check(&check).map_err(ModelError::Validation)?;

        let mut tx = pool.begin().await?;

        let query = format!(
            r#"
            WITH next AS (SELECT nextval(pg_get_serial_sequence('users', 'id')) AS id)
            INSERT INTO users (id, email, name, username, provider, uid, avatar)
            SELECT next.id, $1, $2, 'user' || next.id, $3, $4, $5 FROM next
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.name)
            .bind(data.provider)
            .bind(data.uid)
            .bind(data.avatar)
            .fetch_one(&mut *tx)
            .await?;

        Profile::create_for_user(&mut *tx, user.id).await?;
        tx.commit().await?;

        info!(user_id = user.id, username = %user.username, "Created user");
        Ok(user)
    }

    /// Finds or creates the user behind a federated login
    ///
    /// A new user gets the email and name of the payload and the avatar at
    /// `info.image` (fetched over HTTPS). A failed avatar download is
    /// logged and the user is created without one. Whether found or
    /// created, the provider's profile link is then written to the
    /// profile.
    ///
    /// Calling this twice with the same provider and uid returns the same
    /// user.
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` if a new user would have no name or email
    /// - `ModelError::Database` on database failure, including an email
    ///   already used by another account
    pub async fn from_federated(
        pool: &PgPool,
        auth: &FederatedAuth,
        avatars: &AvatarStore,
    ) -> ModelResult<Self> {
        let user = match Self::find_by_provider(pool, &auth.provider, &auth.uid).await? {
            Some(user) => user,
            None => Self::create_federated(pool, auth, avatars).await?,
        };

        // No compensation if this fails: the user stays created
        let (kind, link) = auth.profile_link();
        if Profile::update_links(pool, user.id, kind, link).await?.is_none() {
            debug!(user_id = user.id, "User has no profile, link not stored");
        }

        Ok(user)
    }

    async fn create_federated(
        pool: &PgPool,
        auth: &FederatedAuth,
        avatars: &AvatarStore,
    ) -> ModelResult<Self> {
        let data = NewUser {
            email: auth.info.email.clone().unwrap_or_default(),
            name: auth.info.name.clone().unwrap_or_default(),
            provider: Some(auth.provider.clone()),
            uid: Some(auth.uid.clone()),
            avatar: None,
        };

        let user = match Self::create(pool, data).await {
            Ok(user) => user,
            // Lost a race against a concurrent login with the same identity
            Err(e) if is_provider_conflict(&e) => {
                return Self::find_by_provider(pool, &auth.provider, &auth.uid)
                    .await?
                    .ok_or(e);
            }
            Err(e) => return Err(e),
        };

        let Some(image) = auth.secure_image() else {
            return Ok(user);
        };

        match avatars.store_remote(user.id, &image).await {
            Ok(path) => Ok(Self::write_avatar(pool, user.id, &path).await?.unwrap_or(user)),
            Err(e) => {
                warn!(user_id = user.id, error = %e, "Could not fetch avatar for new user");
                Ok(user)
            }
        }
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username, ignoring case
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE lower(username) = lower($1)",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1::citext", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the user behind a provider identity
    pub async fn find_by_provider(
        pool: &PgPool,
        provider: &str,
        uid: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE provider = $1 AND uid = $2",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(provider)
            .bind(uid)
            .fetch_optional(pool)
            .await
    }

    /// Applies changes to a user and saves them
    ///
    /// The resulting record must pass the update-time rules:
    ///
    /// - name present, 2 to 45 characters
    /// - username present, 2 to 20 characters, letters and digits only,
    ///   no `admin` prefix (except `admin` plus one character), unique
    ///   ignoring case
    /// - avatar present with a `.png`, `.jpg`, `.jpeg` or `.gif` extension
    ///
    /// # Errors
    ///
    /// - `ModelError::NotFound` if the user does not exist
    /// - `ModelError::Validation` with every failing field
    pub async fn update(pool: &PgPool, id: i64, data: UpdateUser) -> ModelResult<Self> {
        let mut user = Self::find_by_id(pool, id)
            .await?
            .ok_or(ModelError::NotFound("User"))?;

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(username) = data.username {
            user.username = username;
        }

        user.validate_for_update(pool).await?;

        let query = format!(
            r#"
            UPDATE users SET name = $2, username = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&user.name)
            .bind(&user.username)
            .fetch_optional(pool)
            .await?
            .ok_or(ModelError::NotFound("User"))
    }

    /// Points the user's avatar at a stored file
    ///
    /// Runs the update-time rules, so a path without an image extension is
    /// rejected.
    pub async fn set_avatar(pool: &PgPool, id: i64, path: &str) -> ModelResult<Self> {
        let mut user = Self::find_by_id(pool, id)
            .await?
            .ok_or(ModelError::NotFound("User"))?;

        user.avatar = Some(path.to_string());
        user.validate_for_update(pool).await?;

        Self::write_avatar(pool, id, path)
            .await?
            .ok_or(ModelError::NotFound("User"))
    }

    /// Stores an uploaded avatar and attaches it to the user
    ///
    /// The new file is removed again if the user rejects it; the previous
    /// avatar file is removed once the new one is saved.
    pub async fn replace_avatar(
        pool: &PgPool,
        avatars: &AvatarStore,
        id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> ModelResult<Self> {
        let previous = Self::find_by_id(pool, id)
            .await?
            .ok_or(ModelError::NotFound("User"))?
            .avatar;

        let path = avatars.store_upload(id, filename, bytes).await?;

        match Self::set_avatar(pool, id, &path).await {
            Ok(user) => {
                if let Some(old) = previous.filter(|old| *old != path) {
                    if let Err(e) = avatars.remove(&old).await {
                        warn!(user_id = id, error = %e, "Could not remove previous avatar");
                    }
                }
                Ok(user)
            }
            Err(e) => {
                if let Err(remove_err) = avatars.remove(&path).await {
                    warn!(user_id = id, error = %remove_err, "Could not remove rejected avatar");
                }
                Err(e)
            }
        }
    }

    async fn write_avatar(pool: &PgPool, id: i64, path: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(path)
            .fetch_optional(pool)
            .await
    }

    async fn validate_for_update(&self, pool: &PgPool) -> ModelResult<()> {
        let candidate = UserUpdateCheck {
            name: self.name.clone(),
            username: self.username.clone(),
            avatar: self.avatar.clone().unwrap_or_default(),
        };

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(username) = lower($1) AND id <> $2)",
        )
        .bind(&self.username)
        .bind(self.id)
        .fetch_one(pool)
        .await?;

        let errors = update_errors(&candidate, taken);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Validation(errors))
        }
    }

    /// Deletes a user and everything it owns
    ///
    /// The database cascades to the profile, posts, favorites, comments and
    /// notifications; stored avatar files are removed afterwards. Returns
    /// false if the user did not exist.
    pub async fn delete(pool: &PgPool, avatars: &AvatarStore, id: i64) -> ModelResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if let Err(e) = avatars.remove_all(id).await {
            warn!(user_id = id, error = %e, "Could not remove avatars of deleted user");
        }

        info!(user_id = id, "Deleted user");
        Ok(true)
    }

    /// One page of users, newest first
    pub async fn paginate(pool: &PgPool, page: i64) -> Result<UserPage, sqlx::Error> {
        let page = page.max(1);
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(PER_PAGE)
            .bind(page_offset(page))
            .fetch_all(pool)
            .await?;
        let total = Self::count(pool).await?;

        Ok(UserPage {
            users,
            page,
            per_page: PER_PAGE,
            total,
            total_pages: total_pages(total),
        })
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Users with the admin flag
    pub async fn admin_users(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE admin ORDER BY id", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Searches users by username, email and name
    ///
    /// Runs one substring pass for the username (query minus its first
    /// character), one for the email (query without whitespace) and one
    /// per word of the query (minus its first character) for the name.
    /// Users matched by more passes rank first; ties keep the order in
    /// which they were first matched.
    pub async fn search(pool: &PgPool, q: &str) -> Result<Vec<Self>, sqlx::Error> {
        let terms = SearchTerms::parse(q);
        let mut hits = Vec::new();

        for (field, term) in terms.passes() {
            let query = format!(
                "SELECT {} FROM users WHERE {} LIKE $1 ESCAPE '\\' ORDER BY id",
                USER_COLUMNS,
                field.column()
            );

            let matched = sqlx::query_as::<_, User>(&query)
                .bind(contains_pattern(term))
                .fetch_all(pool)
                .await?;
            hits.extend(matched);
        }

        debug!(query = %q, hits = hits.len(), "User search finished");
        Ok(rank_by_frequency(hits, |user| user.id))
    }

    /// Local passwords are disabled; users only sign in through a provider
    pub fn password_required(&self) -> bool {
        false
    }

    /// Whether the user has favorited a post
    pub async fn is_favorite(&self, pool: &PgPool, post_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM posts_users WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(self.id)
        .bind(post_id)
        .fetch_one(pool)
        .await
    }

    /// Favorites a post; returns false if it already was a favorite
    ///
    /// # Errors
    ///
    /// `ModelError::NotFound` if the post does not exist.
    pub async fn add_favorite(&self, pool: &PgPool, post_id: i64) -> ModelResult<bool> {
        if Post::find_by_id(pool, post_id).await?.is_none() {
            return Err(ModelError::NotFound("Post"));
        }

        let result = sqlx::query(
            "INSERT INTO posts_users (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(self.id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a favorite; returns false if the post was not a favorite
    pub async fn remove_favorite(&self, pool: &PgPool, post_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts_users WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(self.id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Favorited posts, newest first
    pub async fn favorites(&self, pool: &PgPool) -> Result<Vec<Post>, sqlx::Error> {
        let columns = POST_COLUMNS
            .split(", ")
            .map(|c| format!("posts.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            r#"
            SELECT {} FROM posts
            JOIN posts_users ON posts_users.post_id = posts.id
            WHERE posts_users.user_id = $1
            ORDER BY posts.created_at DESC, posts.id DESC
            "#,
            columns
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(self.id)
            .fetch_all(pool)
            .await
    }

    /// The user's five most recent posts
    pub async fn recent_posts(&self, pool: &PgPool) -> Result<Vec<Post>, sqlx::Error> {
        Post::list_by_buyer(pool, self.id, RECENT_POSTS_LIMIT).await
    }

    /// The user's 15 most recent notifications
    pub async fn recent_notifications(
        &self,
        pool: &PgPool,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        Notification::list_recent(pool, self.id, RECENT_LIMIT).await
    }

    /// Finds or creates a notification for this user
    ///
    /// Repeated calls with the same arguments return the same notification.
    pub async fn get_notification(
        &self,
        pool: &PgPool,
        post_id: i64,
        commenter_id: i64,
        content: &str,
        comment_id: Option<i64>,
    ) -> Result<Notification, sqlx::Error> {
        let key = NotificationKey {
            user_id: self.id,
            post_id,
            commenter_id,
            content: content.to_string(),
            comment_id,
        };

        Notification::find_or_create(pool, &key).await
    }

    /// Marks every unread notification as read; returns how many changed
    pub async fn mark_all_notifications_as_read(&self, pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read_at = NOW(), updated_at = NOW()
            WHERE user_id = $1 AND read_at IS NULL
            "#,
        )
        .bind(self.id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Number of unread notifications
    pub async fn unread_counter(&self, pool: &PgPool) -> Result<usize, sqlx::Error> {
        let notifications = Notification::list_for_user(pool, self.id).await?;
        Ok(notifications.iter().filter(|n| n.is_unread()).count())
    }

    /// Records a sign-in
    ///
    /// Increments the sign-in count and shifts the current sign-in time and
    /// IP into the `last_*` columns.
    pub async fn track_sign_in(
        pool: &PgPool,
        id: i64,
        ip: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users SET
                sign_in_count = sign_in_count + 1,
                last_sign_in_at = COALESCE(current_sign_in_at, NOW()),
                current_sign_in_at = NOW(),
                last_sign_in_ip = COALESCE(current_sign_in_ip, $2),
                current_sign_in_ip = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(ip)
            .fetch_optional(pool)
            .await
    }

    /// Starts a remember-me period, keeping one already running
    pub async fn remember(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET remember_created_at = COALESCE(remember_created_at, NOW()) WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ends the remember-me period
    pub async fn forget(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET remember_created_at = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::USERNAME_FORMAT_MESSAGE;

    fn candidate(name: &str, username: &str, avatar: &str) -> UserUpdateCheck {
        UserUpdateCheck {
            name: name.to_string(),
            username: username.to_string(),
            avatar: avatar.to_string(),
        }
    }

    #[test]
    fn test_default_username() {
        assert_eq!(default_username(1), "user1");
        assert_eq!(default_username(4521), "user4521");
    }

    #[test]
    fn test_paging() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(3), 20);
        assert_eq!(page_offset(0), 0);
        assert_eq!(page_offset(-4), 0);

        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
    }

    #[test]
    fn test_update_errors_include_uniqueness() {
        let errors = update_errors(&candidate("Minh", "minh01", "a.png"), true);
        assert_eq!(
            errors,
            vec![FieldError::new("username", USERNAME_TAKEN_MESSAGE)]
        );

        assert!(update_errors(&candidate("Minh", "minh01", "a.png"), false).is_empty());
    }

    #[test]
    fn test_update_errors_are_ordered_by_field() {
        let errors = update_errors(&candidate("Minh", "admin_1", ""), true);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["avatar", "username", "username"]);
        assert!(errors.iter().any(|e| e.message == USERNAME_FORMAT_MESSAGE));
    }

    #[test]
    fn test_password_never_required() {
        let user = User {
            id: 1,
            email: "an@example.com".to_string(),
            provider: Some("facebook".to_string()),
            uid: Some("1".to_string()),
            name: "An".to_string(),
            username: "user1".to_string(),
            avatar: None,
            admin: false,
            sign_in_count: 0,
            current_sign_in_at: None,
            last_sign_in_at: None,
            current_sign_in_ip: None,
            last_sign_in_ip: None,
            remember_created_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!user.password_required());
    }
}
