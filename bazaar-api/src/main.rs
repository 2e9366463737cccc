//! # Bazaar API Server
//!
//! JSON API of the Bazaar marketplace: federated sign-in, user accounts
//! and directory, posts with comments and notifications, favorites,
//! avatar uploads and geocoding.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p bazaar-api
//! ```

use bazaar_api::{
    app::{build_router, AppState},
    config::Config,
};
use bazaar_shared::{
    db::{self, DatabaseConfig},
    geocoding::{GeocodeCache, Geocoder, MemoryCache, RedisCache},
    redis::{RedisClient, RedisConfig},
    storage::AvatarStore,
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_api=debug,bazaar_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Bazaar API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = db::create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::new(config.database.url.clone())
    })
    .await?;

    db::run_migrations(&pool).await?;
    let migrations = db::get_migration_status(&pool).await?;
    tracing::info!(
        applied = migrations.applied_migrations,
        up_to_date = migrations.is_up_to_date,
        latest = ?migrations.latest_version,
        "Database schema ready"
    );

    let cache = geocode_cache(config.redis_url.as_deref()).await;
    let geocoder = Geocoder::new(config.geocoder.clone(), Some(cache))?;
    let avatars = AvatarStore::new(config.uploads.store_config())?;
    tracing::info!(root = %avatars.root().display(), "Avatar storage ready");

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, avatars, geocoder));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db::close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Redis cache when `REDIS_URL` is set and reachable, in-process otherwise
async fn geocode_cache(redis_url: Option<&str>) -> Arc<dyn GeocodeCache> {
    let Some(url) = redis_url else {
        tracing::info!("REDIS_URL not set, caching geocoding answers in memory");
        return Arc::new(MemoryCache::new());
    };

    let config = RedisConfig {
        url: url.to_string(),
        command_timeout_secs: 2,
    };

    match RedisClient::new(config).await {
        Ok(client) => Arc::new(RedisCache::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, caching geocoding answers in memory");
            Arc::new(MemoryCache::new())
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
