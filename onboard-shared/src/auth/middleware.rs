/// Bearer authentication primitives for Axum
///
/// Extracts the bearer token from the `Authorization` header and validates it
/// with the configured [`JwtIssuer`]. The API's auth layer inserts the
/// resulting [`AuthContext`] into request extensions for handlers to use.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use onboard_shared::auth::jwt::{JwtIssuer, TokenSigner};
/// use onboard_shared::auth::middleware::authenticate;
/// use uuid::Uuid;
///
/// let issuer = JwtIssuer::new("secret-key-at-least-32-bytes-long!!");
/// let token = issuer.issue(Uuid::new_v4(), "a@b.com").unwrap();
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     header::AUTHORIZATION,
///     HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
/// );
///
/// let caller = authenticate(&headers, &issuer).unwrap();
/// assert_eq!(caller.email, "a@b.com");
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{JwtError, JwtIssuer};

/// The authenticated caller, added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email the token was issued for
    pub email: String,
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header isn't `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid token issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

/// Extracts the raw token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Validates the bearer token in `headers` and returns the caller
pub fn authenticate(headers: &HeaderMap, issuer: &JwtIssuer) -> Result<AuthContext, AuthError> {
    let claims = issuer.verify(bearer_token(headers)?)?;

    Ok(AuthContext {
        user_id: claims.sub,
        email: claims.email,
    })
}
