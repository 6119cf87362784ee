/// Company registration endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/register
/// Content-Type: multipart/form-data
///
/// company=<JSON>          company profile with nested address
/// user=<JSON>             primary user account
/// termsAccepted=true
/// document_<name>=<file>  zero or more supporting documents
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "Registration successful",
///   "token": "eyJ...",
///   "user": { "id": "uuid", "email": "owner@acme.example", ... },
///   "company": { "id": "uuid", "tax_id": "TX-1", "documents": [ ... ], ... }
/// }
/// ```
///
/// When the registration commits but no token could be issued, `token` is
/// null and `warning` explains why.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed form or failed validation (per-field details)
/// - `409 Conflict`: Tax id or email already registered
/// - `413 Payload Too Large`: Body exceeds `API_MAX_BODY_BYTES`
/// - `500 Internal Server Error`: Server error

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use onboard_shared::{
    models::{company::CompanyDetails, user::User},
    registration::{Attachment, CompanyPayload, RegistrationSubmission, UserPayload},
};
use serde::Serialize;
use tracing::debug;

/// Prefix of form fields carrying documents
pub const DOCUMENT_FIELD_PREFIX: &str = "document_";

/// Registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,

    /// Bearer token, null if issuance failed
    pub token: Option<String>,

    pub user: User,

    pub company: CompanyDetails,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn parse_json_field<T: serde::de::DeserializeOwned>(
    name: &str,
    raw: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(ValidationErrorDetail {
                field: name.to_string(),
                message: format!("Invalid JSON: {}", e),
            });
            None
        }
    }
}

/// Reads the multipart body into a submission
///
/// Unknown fields are ignored. Empty file inputs (no name, no bytes) are
/// skipped.
async fn read_submission(multipart: &mut Multipart) -> ApiResult<RegistrationSubmission> {
    let mut errors = Vec::new();
    let mut company: Option<CompanyPayload> = None;
    let mut user: Option<UserPayload> = None;
    let mut terms_accepted = false;
    let mut attachments = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "company" => {
                let raw = field.text().await?;
                company = parse_json_field("company", &raw, &mut errors);
            }
            "user" => {
                let raw = field.text().await?;
                user = parse_json_field("user", &raw, &mut errors);
            }
            "termsAccepted" | "terms_accepted" => {
                terms_accepted = field.text().await?.trim() == "true";
            }
            _ if name.starts_with(DOCUMENT_FIELD_PREFIX) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;

                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                if file_name.is_empty() {
                    errors.push(ValidationErrorDetail {
                        field: name.clone(),
                        message: "Document is missing a file name".to_string(),
                    });
                    continue;
                }

                attachments.push(Attachment {
                    field_name: name.clone(),
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {
                debug!(field = %name, "Ignoring unknown registration field");
            }
        }
    }

    if company.is_none() && !errors.iter().any(|e| e.field == "company") {
        errors.push(ValidationErrorDetail {
            field: "company".to_string(),
            message: "Company information is required".to_string(),
        });
    }
    if user.is_none() && !errors.iter().any(|e| e.field == "user") {
        errors.push(ValidationErrorDetail {
            field: "user".to_string(),
            message: "User information is required".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    Ok(RegistrationSubmission {
        company: company.unwrap_or_default(),
        user: user.unwrap_or_default(),
        terms_accepted,
        attachments,
    })
}

/// Register a company with its primary user and documents
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let submission = read_submission(&mut multipart).await?;

    debug!(
        documents = submission.attachments.len(),
        "Registration submission received"
    );

    let registration = state.registration.register(submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            token: registration.token,
            user: registration.user,
            company: registration.company,
            warning: registration.warning,
        }),
    ))
}
