/// Registration payloads and their validation
///
/// The client posts the company and user as JSON documents inside a multipart
/// form. Both camelCase and snake_case field names are accepted; missing
/// fields deserialize as empty so validation can name them.

use std::fmt;

use bytes::Bytes;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::error::FieldError;
use crate::models::company::{Address, CreateCompany};
use crate::models::user::ROLES;
use crate::storage::sanitize_file_name;

/// Widest original file name the documents table holds
const MAX_DOCUMENT_NAME_CHARS: usize = 512;

/// Postal address as submitted
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AddressPayload {
    #[validate(length(min = 1, max = 255, message = "Street is required (at most 255 characters)"))]
    pub street: String,

    #[validate(length(min = 1, max = 255, message = "City is required (at most 255 characters)"))]
    pub city: String,

    #[validate(length(min = 1, max = 255, message = "State is required (at most 255 characters)"))]
    pub state: String,

    #[serde(alias = "zipCode", alias = "zip")]
    #[validate(length(min = 1, max = 32, message = "Zip code is required (at most 32 characters)"))]
    pub zip_code: String,

    #[validate(length(min = 1, max = 128, message = "Country is required (at most 128 characters)"))]
    pub country: String,
}

/// Company profile as submitted
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CompanyPayload {
    #[serde(alias = "companyName")]
    #[validate(length(min = 1, max = 255, message = "Company name is required (at most 255 characters)"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "Industry is required (at most 255 characters)"))]
    pub industry: String,

    #[serde(alias = "companySize")]
    #[validate(length(min = 1, max = 64, message = "Company size is required (at most 64 characters)"))]
    pub size: String,

    #[validate(length(max = 512, message = "Website must be at most 512 characters"))]
    pub website: Option<String>,

    #[serde(alias = "taxId")]
    #[validate(length(min = 1, max = 128, message = "Tax ID is required (at most 128 characters)"))]
    pub tax_id: String,

    #[validate(length(min = 1, max = 64, message = "Phone is required (at most 64 characters)"))]
    pub phone: String,

    #[validate(nested)]
    pub address: AddressPayload,
}

/// Primary user account as submitted
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UserPayload {
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, max = 255, message = "First name is required (at most 255 characters)"))]
    pub first_name: String,

    #[serde(alias = "lastName")]
    #[validate(length(min = 1, max = 255, message = "Last name is required (at most 255 characters)"))]
    pub last_name: String,

    #[validate(
        length(min = 1, max = 255, message = "Email is required (at most 255 characters)"),
        email(message = "Invalid email format")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(custom(function = "validate_role"))]
    pub role: String,

    #[validate(length(min = 1, max = 255, message = "Department is required (at most 255 characters)"))]
    pub department: String,

    #[serde(alias = "jobTitle")]
    #[validate(length(min = 1, max = 255, message = "Job title is required (at most 255 characters)"))]
    pub job_title: String,

    #[serde(alias = "userPhone")]
    #[validate(length(min = 1, max = 64, message = "Phone is required (at most 64 characters)"))]
    pub phone: String,
}

impl fmt::Debug for UserPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPayload")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .field("department", &self.department)
            .field("job_title", &self.job_title)
            .field("phone", &self.phone)
            .finish()
    }
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if ROLES.contains(&role) {
        return Ok(());
    }

    let mut err = ValidationError::new("role");
    err.message = Some(format!("Role must be one of {}", ROLES.join(", ")).into());
    Err(err)
}

/// An uploaded file taken from a `document_*` form field
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Form field the file arrived in
    pub field_name: String,

    /// File name as given by the client
    pub file_name: String,

    /// Declared content type, if any
    pub content_type: Option<String>,

    pub data: Bytes,
}

/// Everything a registration request carries
#[derive(Debug, Clone, Default)]
pub struct RegistrationSubmission {
    pub company: CompanyPayload,
    pub user: UserPayload,
    pub terms_accepted: bool,
    pub attachments: Vec<Attachment>,
}

impl AddressPayload {
    fn normalized(self) -> Self {
        Self {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

impl CompanyPayload {
    /// Trims every field; a blank website becomes None
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            size: self.size.trim().to_string(),
            website: self
                .website
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty()),
            tax_id: self.tax_id.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.normalized(),
        }
    }

    pub fn into_create(self) -> CreateCompany {
        CreateCompany {
            name: self.name,
            industry: self.industry,
            size: self.size,
            website: self.website,
            tax_id: self.tax_id,
            phone: self.phone,
            address: Address {
                street: self.address.street,
                city: self.address.city,
                state: self.address.state,
                zip_code: self.address.zip_code,
                country: self.address.country,
            },
        }
    }
}

impl UserPayload {
    /// Trims every field except the password and lowercases the email
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
            role: self.role.trim().to_string(),
            department: self.department.trim().to_string(),
            job_title: self.job_title.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

impl RegistrationSubmission {
    pub fn normalized(self) -> Self {
        Self {
            company: self.company.normalized(),
            user: self.user.normalized(),
            ..self
        }
    }

    /// Collects every validation failure, sorted by field path
    pub fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if let Err(e) = self.company.validate() {
            collect_field_errors("company", &e, &mut errors);
        }
        if let Err(e) = self.user.validate() {
            collect_field_errors("user", &e, &mut errors);
        }
        for attachment in &self.attachments {
            if let Err(message) = check_file_name(&attachment.file_name) {
                errors.push(FieldError::new(attachment.field_name.clone(), message));
            }
        }
        if !self.terms_accepted {
            errors.push(FieldError::new("terms_accepted", "Terms and conditions must be accepted"));
        }

        errors.sort_by(|a, b| a.field.cmp(&b.field));
        errors
    }
}

/// Checks an uploaded file name against what the store and schema accept
fn check_file_name(file_name: &str) -> Result<(), String> {
    if file_name.chars().count() > MAX_DOCUMENT_NAME_CHARS {
        return Err(format!(
            "File name must be at most {} characters",
            MAX_DOCUMENT_NAME_CHARS
        ));
    }

    sanitize_file_name(file_name)
        .map(|_| ())
        .map_err(|_| format!("Invalid file name: {:?}", file_name))
}

/// Flattens nested validator output into dotted field paths
pub fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|e| FieldError {
                    field: path.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}
