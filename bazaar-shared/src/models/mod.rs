/// Database models
///
/// Each model owns its row type and the queries that read and write it.
///
/// # Models
///
/// - `user`: accounts, search, favorites and notification helpers
/// - `profile`: per-user provider links
/// - `post`: listings published by a user
/// - `comment`: comments on posts
/// - `notification`: comment notifications

pub mod comment;
pub mod notification;
pub mod post;
pub mod profile;
pub mod user;

pub use comment::{Comment, NewComment};
pub use notification::{Notification, NotificationKey};
pub use post::{NewPost, Post};
pub use profile::Profile;
pub use user::{NewUser, UpdateUser, User, UserPage};
