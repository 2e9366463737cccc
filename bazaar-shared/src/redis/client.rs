/// Redis client used as the shared cache backend
///
/// Wraps `redis::aio::ConnectionManager`, which reconnects on its own, and
/// adds the handful of commands the cache layer needs (`GET`, `SET` with
/// an optional expiry, `PING`) with per-command timeouts.
///
/// # Example
///
/// ```no_run
/// use bazaar_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RedisConfig::from_env()?;
/// let client = RedisClient::new(config).await?;
///
/// client.set("greeting", "xin chào", Some(60)).await?;
/// assert_eq!(client.get("greeting").await?, Some("xin chào".to_string()));
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use serde::{Deserialize, Serialize};
use std::env;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Redis client errors
#[derive(Error, Debug)]
pub enum RedisClientError {
    /// Connection error
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    /// Command execution error
    #[error("Redis command error: {0}")]
    CommandError(String),

    /// Command did not finish in time
    #[error("Redis command timed out after {0}s")]
    Timeout(u64),

    /// Configuration error
    #[error("Redis configuration error: {0}")]
    ConfigError(String),
}

impl From<RedisError> for RedisClientError {
    fn from(err: RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => {
                RedisClientError::ConnectionError(format!("IO error: {}", err))
            }
            _ => RedisClientError::CommandError(err.to_string()),
        }
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    ///
    /// Format: redis://[username:password@]host:port[/db]
    pub url: String,

    /// Command timeout in seconds
    pub command_timeout_secs: u64,
}

impl RedisConfig {
    /// Reads the configuration from the environment
    ///
    /// # Environment Variables
    ///
    /// - `REDIS_URL`: Redis connection URL (required)
    /// - `REDIS_COMMAND_TIMEOUT_SECS`: Command timeout (default: 2)
    pub fn from_env() -> Result<Self, RedisClientError> {
        dotenvy::dotenv().ok();

        let url = env::var("REDIS_URL").map_err(|_| {
            RedisClientError::ConfigError("REDIS_URL environment variable is required".to_string())
        })?;

        let command_timeout_secs = env::var("REDIS_COMMAND_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        Ok(Self {
            url,
            command_timeout_secs,
        })
    }
}

/// Cloneable Redis client
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("url", &sanitize_url(&self.config.url))
            .finish()
    }
}

impl RedisClient {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the first connection fails.
    pub async fn new(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            RedisClientError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        tracing::info!(
            "Redis client connected successfully to {}",
            sanitize_url(&config.url)
        );

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Sends `PING` and reports whether `PONG` came back
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let mut conn = self.manager.clone();
        let reply: String = self
            .with_timeout(redis::cmd("PING").query_async(&mut conn))
            .await?;

        if reply == "PONG" {
            tracing::debug!("Redis health check: PONG received");
            Ok(true)
        } else {
            tracing::warn!("Redis health check: unexpected response: {}", reply);
            Ok(false)
        }
    }

    /// Reads a string value
    pub async fn get(&self, key: &str) -> Result<Option<String>, RedisClientError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = self
            .with_timeout(redis::cmd("GET").arg(key).query_async(&mut conn))
            .await?;
        Ok(value)
    }

    /// Writes a string value, optionally expiring after `ttl_secs`
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_secs: Option<u64>,
    ) -> Result<(), RedisClientError> {
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl_secs {
            cmd.arg("EX").arg(ttl);
        }

        let _: () = self.with_timeout(cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    /// Returns a handle for commands not wrapped here
    pub fn get_connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Gets the Redis configuration
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Gets connection statistics
    pub async fn stats(&self) -> RedisStats {
        let healthy = self.ping().await.unwrap_or(false);

        RedisStats {
            healthy,
            url: sanitize_url(&self.config.url),
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, RedisClientError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        let secs = self.config.command_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| RedisClientError::Timeout(secs))?
            .map_err(RedisClientError::from)
    }
}

/// Redis connection statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStats {
    /// Whether Redis is healthy (responds to PING)
    pub healthy: bool,

    /// Sanitized Redis URL (credentials removed)
    pub url: String,
}

/// Replaces `user:password@` in a URL with `***:***@` for logging
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..scheme_end + 3];
            let host = &url[at_pos + 1..];
            return format!("{}***:***@{}", scheme, host);
        }
    }
    url.to_string()
}
