//! Redis integration
//!
//! Redis is optional. When `REDIS_URL` is set, geocoding answers are
//! cached there so every API instance shares them; otherwise an
//! in-process cache is used.

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig, RedisStats};
