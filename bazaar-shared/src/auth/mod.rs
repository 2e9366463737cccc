/// Authentication
///
/// Users sign in only through identity providers; there are no local
/// passwords. A successful federated login is answered with JWT access and
/// refresh tokens.
///
/// # Modules
///
/// - [`federated`]: identity-provider payloads and profile links
/// - [`jwt`]: token generation and validation
/// - [`middleware`]: Axum middleware and the [`middleware::AuthContext`] extractor

pub mod federated;
pub mod jwt;
pub mod middleware;
