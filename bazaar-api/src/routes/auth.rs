/// Authentication endpoints
///
/// Users sign in only through an identity provider. A login gateway runs
/// the OAuth dance and posts the resulting payload here; the API finds or
/// creates the user and hands out tokens.
///
/// # Endpoints
///
/// - `POST /v1/auth/federated/callback` - Sign in with a provider payload
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
/// - `POST /v1/auth/sign_out` - End the remember-me period

use super::users::UserResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use bazaar_shared::{
    auth::{
        federated::{verify_callback_secret, FederatedAuth},
        jwt,
        middleware::AuthContext,
    },
    models::User,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Header carrying the gateway's shared secret
pub const CALLBACK_SECRET_HEADER: &str = "x-callback-secret";

/// Query of the callback
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    /// Start a remember-me period
    #[serde(default)]
    pub remember: bool,
}

/// Tokens for a signed-in user
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// Always `Bearer`
    pub token_type: &'static str,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Client address: first `X-Forwarded-For` hop, else the peer address
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Federated login callback
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/federated/callback?remember=true
/// X-Callback-Secret: <shared secret>
/// Content-Type: application/json
///
/// {
///   "provider": "facebook",
///   "uid": "100004",
///   "info": { "email": "an@example.com", "name": "Nguyễn An", "image": "http://..." },
///   "extra": { "raw_info": { "link": "https://www.facebook.com/an" } }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: missing or wrong callback secret
/// - `409 Conflict`: the email belongs to another account
/// - `422 Unprocessable Entity`: missing uid, or a new user without name or email
pub async fn federated_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(payload): Json<FederatedAuth>,
) -> ApiResult<Json<SessionResponse>> {
    let provided = headers
        .get(CALLBACK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_callback_secret(provided, &state.config.callback.secret) {
        tracing::warn!(provider = %payload.provider, "Rejected federated callback");
        return Err(ApiError::Unauthorized("Invalid callback secret".to_string()));
    }

    if payload.provider.trim().is_empty() {
        return Err(ApiError::invalid("provider", "can't be blank"));
    }
    if payload.uid.trim().is_empty() {
        return Err(ApiError::invalid("uid", "can't be blank"));
    }

    let user = User::from_federated(&state.db, &payload, &state.avatars).await?;

    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let user = User::track_sign_in(&state.db, user.id, ip.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if query.remember {
        User::remember(&state.db, user.id).await?;
    }

    tracing::info!(
        user_id = user.id,
        provider = %payload.provider,
        sign_in_count = user.sign_in_count,
        "User signed in"
    );

    let access_claims = jwt::Claims::new(user.id, user.admin, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, user.admin, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(SessionResponse {
        user: UserResponse::new(&user, &state.avatars),
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: jwt::TokenType::Access.default_expiration().num_seconds(),
    }))
}

/// Token refresh endpoint
///
/// The new access token carries the user's current admin flag.
///
/// # Errors
///
/// - `401 Unauthorized`: invalid or expired refresh token, or the user is gone
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.user_id()?)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    let access_claims = jwt::Claims::new(user.id, user.admin, jwt::TokenType::Access);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Ends the remember-me period of the signed-in user
///
/// Tokens stay valid until they expire.
pub async fn sign_out(State(state): State<AppState>, auth: AuthContext) -> ApiResult<StatusCode> {
    User::forget(&state.db, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("10.0.0.9"));
        assert_eq!(client_ip(&headers, None), None);

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_callback_rejects_wrong_secret() {
        let body = serde_json::json!({"provider": "facebook", "uid": "1"}).to_string();

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/auth/federated/callback")
                    .header("content-type", "application/json")
                    .header(CALLBACK_SECRET_HEADER, "not-the-secret")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let claims = jwt::Claims::new(5, false, jwt::TokenType::Access);
        let token = jwt::create_token(
            &claims,
            &crate::config::tests::test_config().jwt.secret,
        )
        .unwrap();
        let body = serde_json::json!({ "refresh_token": token }).to_string();

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/auth/refresh")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
