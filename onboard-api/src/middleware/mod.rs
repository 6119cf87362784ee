/// Middleware modules for the API server
///
/// - `security`: Security response headers
///
/// Bearer authentication lives in `app::jwt_auth_layer`.

pub mod security;
