/// Bearer token issuance and validation
///
/// Tokens are HS256-signed JWTs binding a user's id and email. They are issued
/// after a successful registration or login and validated by the API's
/// authentication layer on every protected request.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, 24 hours by default
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret**: Injected once at startup from configuration, at least 32 bytes
///
/// # Example
///
/// ```
/// use onboard_shared::auth::jwt::{JwtIssuer, TokenSigner};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = JwtIssuer::new("your-secret-key-at-least-32-bytes");
/// let user_id = Uuid::new_v4();
///
/// let token = issuer.issue(user_id, "a@b.com")?;
/// let claims = issuer.verify(&token)?;
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.email, "a@b.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim written into and required on every token
pub const ISSUER: &str = "onboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims
///
/// - `sub`: User ID
/// - `email`: User email at the time of issuance
/// - `iss`: Always "onboard"
/// - `iat` / `nbf` / `exp`: Unix timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// User email
    pub email: String,

    /// Issuer
    pub iss: String,

    /// Issued at
    pub iat: i64,

    /// Expiration time
    pub exp: i64,

    /// Not before
    pub nbf: i64,
}

impl Claims {
    /// Creates claims valid from now for `expires_in`
    pub fn new(user_id: Uuid, email: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: email.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues bearer tokens for a user identity
///
/// The registration workflow depends on this trait rather than on
/// [`JwtIssuer`] directly, so token failures can be exercised in tests.
pub trait TokenSigner: Send + Sync {
    /// Signs a token binding `user_id` and `email`
    fn issue(&self, user_id: Uuid, email: &str) -> Result<String, JwtError>;
}

/// HS256 token issuer holding the process-wide signing secret
#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtIssuer {
    /// Default token lifetime
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    /// Creates an issuer with the default 24 hour lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_ttl(secret, Duration::hours(Self::DEFAULT_TTL_HOURS))
    }

    /// Creates an issuer with a custom token lifetime
    pub fn with_ttl(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&header, claims, &key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Validates a token and returns its claims
    ///
    /// Verifies the signature, expiration, not-before time and issuer.
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` if the token is past its expiration
    /// - `JwtError::InvalidIssuer` if it wasn't issued by this service
    /// - `JwtError::ValidationError` for bad signatures or malformed tokens
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
                expected: ISSUER.to_string(),
            },
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        })?;

        Ok(token_data.claims)
    }
}

impl TokenSigner for JwtIssuer {
    fn issue(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, email, self.ttl))
    }
}
