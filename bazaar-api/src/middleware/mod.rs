/// Middleware modules for the API server
///
/// Authentication lives in `bazaar_shared::auth::middleware`; this module
/// holds the response-side layers.

pub mod security;
