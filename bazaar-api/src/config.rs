/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PRODUCTION`: Enables HSTS and strict CORS (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, >= 32 chars)
/// - `CALLBACK_SECRET`: Shared secret of the federated login gateway (required)
/// - `UPLOADS_DIR`: Directory receiving the `uploads/` tree (default: public)
/// - `UPLOADS_BASE_URL`: URL prefix uploads are served under (default: /)
/// - `REDIS_URL`: Geocoder cache backend (optional, in-memory otherwise)
/// - `GEOCODER_*`: see [`GeocoderConfig::from_env`]
///
/// # Example
///
/// ```no_run
/// use bazaar_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use bazaar_shared::geocoding::GeocoderConfig;
use bazaar_shared::storage::AvatarStoreConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Minimum accepted length of `JWT_SECRET` and `CALLBACK_SECRET`
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Federated login callback configuration
    pub callback: CallbackConfig,

    /// Avatar upload configuration
    pub uploads: UploadsConfig,

    /// Redis URL for the geocoder cache
    #[serde(skip_serializing)]
    pub redis_url: Option<String>,

    /// Geocoder configuration
    pub geocoder: GeocoderConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (HSTS on)
    pub production: bool,

    /// Allowed CORS origins, `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(skip_serializing)]
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,
}

/// Federated login callback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Value the gateway sends in `X-Callback-Secret`
    #[serde(skip_serializing)]
    pub secret: String,
}

/// Avatar upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Directory that receives the `uploads/` tree
    pub dir: PathBuf,

    /// Public URL prefix of the `uploads/` tree
    pub base_url: String,
}

impl UploadsConfig {
    /// Avatar store settings for this configuration
    pub fn store_config(&self) -> AvatarStoreConfig {
        AvatarStoreConfig {
            root: self.dir.clone(),
            base_url: self.base_url.clone(),
            ..Default::default()
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    /// - A secret is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let production = env::var("API_PRODUCTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = required_secret("JWT_SECRET")?;
        let callback_secret = required_secret("CALLBACK_SECRET")?;

        let uploads = UploadsConfig {
            dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            base_url: env::var("UPLOADS_BASE_URL").unwrap_or_else(|_| "/".to_string()),
        };

        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        let geocoder = GeocoderConfig::from_env().map_err(anyhow::Error::msg)?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            callback: CallbackConfig {
                secret: callback_secret,
            },
            uploads,
            redis_url,
            geocoder,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn required_secret(name: &str) -> anyhow::Result<String> {
    let secret =
        env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable is required", name))?;

    if secret.len() < MIN_SECRET_LENGTH {
        anyhow::bail!("{} must be at least {} characters long", name, MIN_SECRET_LENGTH);
    }

    Ok(secret)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Configuration for router tests; nothing in it needs a live service
    pub(crate) fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/bazaar_test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            callback: CallbackConfig {
                secret: "callback-secret-at-least-32-bytes-long".to_string(),
            },
            uploads: UploadsConfig {
                dir: std::env::temp_dir().join("bazaar-api-tests"),
                base_url: "https://cdn.example.com/".to_string(),
            },
            redis_url: None,
            geocoder: GeocoderConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(parse_origins("*"), vec!["*"]);
    }

    #[test]
    fn test_secrets_not_serialized() {
        let json = serde_json::to_string(&test_config()).unwrap();
        assert!(!json.contains("test-secret-key"));
        assert!(!json.contains("callback-secret"));
        assert!(!json.contains("bazaar_test"));
    }
}
