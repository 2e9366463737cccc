/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use bazaar_api::{app::AppState, config::Config};
/// use bazaar_shared::geocoding::Geocoder;
/// use bazaar_shared::storage::AvatarStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let avatars = AvatarStore::new(config.uploads.store_config())?;
/// let geocoder = Geocoder::new(config.geocoder.clone(), None)?;
/// let state = AppState::new(pool, config, avatars, geocoder);
/// let app = bazaar_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use bazaar_shared::{
    auth::middleware::authenticate,
    geocoding::Geocoder,
    storage::{AvatarStore, DEFAULT_MAX_BYTES},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Request body limit of the avatar upload (file plus multipart framing)
pub const AVATAR_BODY_LIMIT: usize = DEFAULT_MAX_BYTES + 64 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Avatar file storage
    pub avatars: AvatarStore,

    /// Geocoding client
    pub geocoder: Geocoder,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, avatars: AvatarStore, geocoder: Geocoder) -> Self {
        Self {
            db,
            config: Arc::new(config),
            avatars,
            geocoder,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                         # public
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /federated/callback    # X-Callback-Secret
///     │   ├── POST /refresh
///     │   └── POST /sign_out              # JWT
///     ├── GET    /users, /users/search, /users/admins
///     ├── GET    /users/:id, /users/:id/posts/recent
///     ├── DELETE /users/:id               # JWT, admin
///     ├── GET|PATCH|DELETE /me            # JWT
///     ├── PUT    /me/avatar               # JWT, multipart
///     ├── GET    /me/notifications        # JWT
///     ├── POST   /me/notifications/read   # JWT
///     ├── POST   /me/notifications/:id/read
///     ├── GET    /me/favorites            # JWT
///     ├── PUT|DELETE /me/favorites/:post_id
///     ├── POST   /posts                   # JWT
///     ├── GET    /posts/:id
///     ├── DELETE /posts/:id               # JWT, buyer or admin
///     ├── GET    /posts/:id/comments
///     ├── POST   /posts/:id/comments      # JWT
///     ├── DELETE /comments/:id            # JWT, author or admin
///     └── GET    /geocode, /geocode/reverse, /geocode/distance  # JWT
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Compression
/// 4. Logging (tower-http TraceLayer)
/// 5. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, geocode, health, me, posts, users};

    let require_auth = middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(health::health_check));

    let auth_routes = Router::new()
        .route("/federated/callback", post(auth::federated_callback))
        .route("/refresh", post(auth::refresh))
        .route(
            "/sign_out",
            post(auth::sign_out).route_layer(require_auth.clone()),
        );

    let public_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/search", get(users::search_users))
        .route("/users/admins", get(users::list_admins))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/posts/recent", get(users::recent_posts))
        .route("/posts/:id", get(posts::get_post))
        .route("/posts/:id/comments", get(posts::list_comments));

    let protected_routes = Router::new()
        .route("/users/:id", delete(users::delete_user))
        .route(
            "/me",
            get(me::get_me).patch(me::update_me).delete(me::delete_me),
        )
        .route(
            "/me/avatar",
            put(me::upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/me/notifications", get(me::list_notifications))
        .route("/me/notifications/read", post(me::mark_notifications_read))
        .route("/me/notifications/:id/read", post(me::mark_notification_read))
        .route("/me/favorites", get(me::list_favorites))
        .route(
            "/me/favorites/:post_id",
            put(me::add_favorite).delete(me::remove_favorite),
        )
        .route("/posts", post(posts::create_post))
        .route("/posts/:id", delete(posts::delete_post))
        .route("/posts/:id/comments", post(posts::create_comment))
        .route("/comments/:id", delete(posts::delete_comment))
        .route("/geocode", get(geocode::search))
        .route("/geocode/reverse", get(geocode::reverse))
        .route("/geocode/distance", get(geocode::distance))
        .route_layer(require_auth);

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(public_routes)
        .merge(protected_routes);

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS policy for the configured origins
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, then injects the `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
