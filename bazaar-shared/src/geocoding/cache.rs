//! Cache delegates for geocoding responses
//!
//! The geocoder stores raw service responses under
//! `{prefix}{sha256(request url)}`. Cache failures are logged and treated
//! as misses; they never fail a lookup.

use crate::redis::RedisClient;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

/// Storage for cached geocoding responses
#[async_trait]
pub trait GeocodeCache: Send + Sync {
    /// Returns the cached value for `key`, if any
    async fn read(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`
    async fn write(&self, key: &str, value: &str, ttl_seconds: Option<u64>);
}

/// Cache key for a request URL
///
/// The URL is hashed so API keys never end up in cache keys.
pub fn cache_key(prefix: &str, url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{}{}", prefix, hex::encode(digest))
}

/// In-process cache, used when no Redis is configured
///
/// Entries never expire; the TTL is ignored.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached responses
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl GeocodeCache for MemoryCache {
    async fn read(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn write(&self, key: &str, value: &str, _ttl_seconds: Option<u64>) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

/// Redis-backed cache shared between API instances
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: RedisClient,
}

impl RedisCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeocodeCache for RedisCache {
    async fn read(&self, key: &str) -> Option<String> {
        match self.client.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Geocode cache read failed");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str, ttl_seconds: Option<u64>) {
        if let Err(e) = self.client.set(key, value, ttl_seconds).await {
            warn!(error = %e, "Geocode cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_hides_url() {
        let key = cache_key("geocoder:", "https://maps.example.com/?key=SECRET&address=Hue");
        assert!(key.starts_with("geocoder:"));
        assert!(!key.contains("SECRET"));
        assert_eq!(key.len(), "geocoder:".len() + 64);
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = cache_key("g:", "https://a.example.com/?q=1");
        let b = cache_key("g:", "https://a.example.com/?q=1");
        let c = cache_key("g:", "https://a.example.com/?q=2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty().await);
        assert_eq!(cache.read("k").await, None);

        cache.write("k", "v", Some(10)).await;
        assert_eq!(cache.read("k").await.as_deref(), Some("v"));
        assert_eq!(cache.len().await, 1);
    }
}
