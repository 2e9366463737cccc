//! # Bazaar Shared Library
//!
//! Models, authentication and service clients shared by the Bazaar API
//! server.
//!
//! ## Module Organization
//!
//! - `auth`: federated login payloads, JWT tokens, Axum middleware
//! - `db`: connection pool and migrations
//! - `error`: model error types
//! - `geocoding`: geocoding client, configuration and distances
//! - `models`: users, profiles, posts, comments, notifications
//! - `redis`: optional Redis client backing the geocoding cache
//! - `search`: user search term parsing and ranking
//! - `storage`: avatar file storage
//! - `validation`: field validation rules

pub mod auth;
pub mod db;
pub mod error;
pub mod geocoding;
pub mod models;
pub mod redis;
pub mod search;
pub mod storage;
pub mod validation;

/// Current version of the Bazaar shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
