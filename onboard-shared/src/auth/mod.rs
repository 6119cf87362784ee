/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token issuance and validation
/// - [`middleware`]: Authenticated caller context and bearer header parsing
///
/// # Example
///
/// ```no_run
/// use onboard_shared::auth::password::{hash_password, verify_password};
/// use onboard_shared::auth::jwt::{JwtIssuer, TokenSigner};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let issuer = JwtIssuer::new("secret-key-at-least-32-bytes-long!!");
/// let token = issuer.issue(Uuid::new_v4(), "owner@acme.test")?;
/// let claims = issuer.verify(&token)?;
/// assert_eq!(claims.email, "owner@acme.test");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
