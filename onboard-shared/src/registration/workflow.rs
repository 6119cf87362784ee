/// The registration transaction
///
/// Validation, duplicate checks and password hashing happen before anything
/// is written. Company, user and documents are then inserted in one database
/// transaction while the uploaded files are streamed to the file store. A
/// failure at any point rolls the transaction back and removes the files this
/// attempt wrote. The token is issued only after commit.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, info, warn};

use super::error::{DuplicateKey, RegistrationError};
use super::payload::{Attachment, RegistrationSubmission, UserPayload};
use crate::auth::jwt::TokenSigner;
use crate::auth::password::hash_password;
use crate::models::company::{Company, CompanyDetails, CreateCompany};
use crate::models::document::{CreateDocument, Document};
use crate::models::user::{CreateUser, User};
use crate::storage::FileStore;

/// Warning attached to a registration whose token couldn't be issued
pub const TOKEN_WARNING: &str = "registration succeeded, token issuance failed";

/// A committed registration
#[derive(Debug, Clone)]
pub struct Registration {
    /// Bearer token for the new user, None if issuance failed
    pub token: Option<String>,

    /// Set when the registration committed but something after it failed
    pub warning: Option<String>,

    pub user: User,

    pub company: CompanyDetails,
}

/// Registers a company together with its primary user and documents
#[derive(Clone)]
pub struct RegistrationService {
    pool: PgPool,
    files: Arc<dyn FileStore>,
    tokens: Arc<dyn TokenSigner>,
}

impl RegistrationService {
    pub fn new(pool: PgPool, files: Arc<dyn FileStore>, tokens: Arc<dyn TokenSigner>) -> Self {
        Self { pool, files, tokens }
    }

    /// Runs the whole registration
    ///
    /// # Errors
    ///
    /// - `Validation` when any field is missing or malformed, or terms weren't
    ///   accepted
    /// - `Conflict` when the tax id or email is already taken, including when a
    ///   concurrent registration wins the race
    /// - `Internal` for hashing, storage and database failures
    ///
    /// In every error case no rows remain and no files written by this call
    /// are left behind (removal failures are logged).
    pub async fn register(&self, submission: RegistrationSubmission) -> Result<Registration, RegistrationError> {
        let submission = submission.normalized();

        let errors = submission.field_errors();
        if !errors.is_empty() {
            debug!(errors = errors.len(), "Registration rejected by validation");
            return Err(RegistrationError::Validation(errors));
        }

        let RegistrationSubmission {
            company,
            user,
            attachments,
            ..
        } = submission;

        if Company::find_by_tax_id(&self.pool, &company.tax_id).await?.is_some() {
            return Err(RegistrationError::Conflict(DuplicateKey::TaxId));
        }

        if User::find_by_email(&self.pool, &user.email).await?.is_some() {
            return Err(RegistrationError::Conflict(DuplicateKey::Email));
        }

        let password = user.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| RegistrationError::Internal(format!("Password hashing task failed: {}", e)))??;

        let mut tx = self.pool.begin().await?;
        let mut written: Vec<String> = Vec::new();

        let inserted = self
            .insert_all(&mut tx, company.into_create(), user, password_hash, &attachments, &mut written)
            .await;

        let (company, user, documents) = match inserted {
            Ok(rows) => rows,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Registration rollback failed");
                }
                self.discard_files(&written).await;
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            self.discard_files(&written).await;
            return Err(e.into());
        }

        info!(
            company_id = %company.id,
            user_id = %user.id,
            documents = documents.len(),
            "Registration committed"
        );

        let (token, warning) = match self.tokens.issue(user.id, &user.email) {
            Ok(token) => (Some(token), None),
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Token issuance failed after registration");
                (None, Some(TOKEN_WARNING.to_string()))
            }
        };

        let (user, company) = self.reload(user, company, documents).await;

        Ok(Registration {
            token,
            warning,
            user,
            company,
        })
    }

    async fn insert_all(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CreateCompany,
        user: UserPayload,
        password_hash: String,
        attachments: &[Attachment],
        written: &mut Vec<String>,
    ) -> Result<(Company, User, Vec<Document>), RegistrationError> {
        let company = Company::create(&mut **tx, company).await?;

        let user = User::create(
            &mut **tx,
            CreateUser {
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                password_hash,
                role: user.role,
                department: user.department,
                job_title: user.job_title,
                phone: user.phone,
                company_id: company.id,
            },
        )
        .await?;

        let mut documents = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            let mut reader: &[u8] = &attachment.data;
            let stored = self
                .files
                .save(
                    company.id,
                    &attachment.file_name,
                    attachment.content_type.as_deref(),
                    &mut reader,
                )
                .await?;
            written.push(stored.path.clone());

            let file_size = i64::try_from(stored.size)
                .map_err(|_| RegistrationError::Internal(format!("File too large: {} bytes", stored.size)))?;

            let document = Document::create(
                &mut **tx,
                CreateDocument {
                    file_name: attachment.file_name.clone(),
                    file_path: stored.path,
                    file_size,
                    mime_type: stored.mime_type,
                    company_id: company.id,
                },
            )
            .await?;

            debug!(
                company_id = %company.id,
                field = %attachment.field_name,
                file_name = %document.file_name,
                size = document.file_size,
                "Document stored"
            );
            documents.push(document);
        }

        Ok((company, user, documents))
    }

    /// Best-effort removal of files written by a failed attempt
    async fn discard_files(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.files.remove(path).await {
                warn!(path = %path, error = %e, "Failed to remove file after aborted registration");
            }
        }
    }

    /// Reads the committed rows back, falling back to what the insert returned
    async fn reload(&self, user: User, company: Company, documents: Vec<Document>) -> (User, CompanyDetails) {
        let fresh_user = match User::find_by_id(&self.pool, user.id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => user,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Post-commit user reload failed");
                user
            }
        };

        let details = match Company::find_with_documents(&self.pool, company.id).await {
            Ok(Some(details)) => details,
            Ok(None) => CompanyDetails { company, documents },
            Err(e) => {
                warn!(company_id = %company.id, error = %e, "Post-commit company reload failed");
                CompanyDetails { company, documents }
            }
        };

        (fresh_user, details)
    }
}
