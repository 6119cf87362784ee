/// Registration errors
///
/// Every failure of [`super::RegistrationService::register`] is one of three
/// kinds: the submission was invalid, it collided with an existing company or
/// user, or something went wrong on our side.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::storage::StorageError;

/// A single failed field, named by its dotted path (e.g. `company.address.city`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The unique key a registration collided on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKey {
    TaxId,
    Email,
}

impl DuplicateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateKey::TaxId => "tax_id",
            DuplicateKey::Email => "email",
        }
    }

    /// Client-facing message
    pub fn message(&self) -> &'static str {
        match self {
            DuplicateKey::TaxId => "A company with this tax_id already exists",
            DuplicateKey::Email => "A user with this email already exists",
        }
    }

    /// Maps a unique index name onto the key it guards
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        if constraint.contains("tax_id") {
            Some(DuplicateKey::TaxId)
        } else if constraint.contains("email") {
            Some(DuplicateKey::Email)
        } else {
            None
        }
    }
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration failure
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The submission failed validation; nothing was written
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// A live company or user already holds the key
    #[error("Duplicate {0}")]
    Conflict(DuplicateKey),

    /// Storage, hashing or database failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for RegistrationError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                if let Some(key) = db_err.constraint().and_then(DuplicateKey::from_constraint) {
                    return RegistrationError::Conflict(key);
                }
            }
        }

        RegistrationError::Internal(format!("Database error: {}", err))
    }
}

impl From<StorageError> for RegistrationError {
    fn from(err: StorageError) -> Self {
        RegistrationError::Internal(err.to_string())
    }
}

impl From<PasswordError> for RegistrationError {
    fn from(err: PasswordError) -> Self {
        RegistrationError::Internal(err.to_string())
    }
}
