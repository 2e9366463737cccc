/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Federated login callback, token refresh, sign-out
/// - `users`: Public user directory and admin user removal
/// - `me`: The signed-in user's account, avatar, notifications, favorites
/// - `posts`: Posts and their comments
/// - `geocode`: Address lookups and distances

pub mod auth;
pub mod geocode;
pub mod health;
pub mod me;
pub mod posts;
pub mod users;
