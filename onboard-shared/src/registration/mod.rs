/// Company registration
///
/// A registration creates one company, its primary user and any documents
/// uploaded with it, atomically. See [`RegistrationService::register`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use onboard_shared::auth::jwt::JwtIssuer;
/// use onboard_shared::registration::{RegistrationService, RegistrationSubmission};
/// use onboard_shared::storage::LocalFileStore;
///
/// # async fn example(pool: sqlx::PgPool, submission: RegistrationSubmission) -> Result<(), Box<dyn std::error::Error>> {
/// let service = RegistrationService::new(
///     pool,
///     Arc::new(LocalFileStore::new("uploads")),
///     Arc::new(JwtIssuer::new("your-secret-key-at-least-32-bytes")),
/// );
///
/// let registration = service.register(submission).await?;
/// println!("company {} created", registration.company.company.id);
/// # Ok(())
/// # }
/// ```

pub mod error;
pub mod payload;
pub mod workflow;

pub use error::{DuplicateKey, FieldError, RegistrationError};
pub use payload::{AddressPayload, Attachment, CompanyPayload, RegistrationSubmission, UserPayload};
pub use workflow::{Registration, RegistrationService, TOKEN_WARNING};
