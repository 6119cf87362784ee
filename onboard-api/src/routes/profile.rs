/// The caller's own profile
///
/// # Endpoints
///
/// - `GET /api/profile` - The user with their company embedded
/// - `PUT /api/profile` - Update name, department, job title or phone
///
/// Both require a bearer token.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use onboard_shared::{
    auth::middleware::AuthContext,
    models::user::{UpdateProfile, User, UserWithCompany},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Profile update request
///
/// Absent fields are left unchanged; present fields must not be blank.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, max = 255, message = "First name must not be blank or longer than 255 characters"))]
    pub first_name: Option<String>,

    #[serde(alias = "lastName")]
    #[validate(length(min = 1, max = 255, message = "Last name must not be blank or longer than 255 characters"))]
    pub last_name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Department must not be blank or longer than 255 characters"))]
    pub department: Option<String>,

    #[serde(alias = "jobTitle")]
    #[validate(length(min = 1, max = 255, message = "Job title must not be blank or longer than 255 characters"))]
    pub job_title: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Phone must not be blank or longer than 64 characters"))]
    pub phone: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

impl UpdateProfileRequest {
    /// Trims every present field
    pub fn normalized(self) -> Self {
        Self {
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            department: trimmed(self.department),
            job_title: trimmed(self.job_title),
            phone: trimmed(self.phone),
        }
    }

    pub fn into_update(self) -> UpdateProfile {
        UpdateProfile {
            first_name: self.first_name,
            last_name: self.last_name,
            department: self.department,
            job_title: self.job_title,
            phone: self.phone,
        }
    }
}

/// Get the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
) -> ApiResult<Json<UserWithCompany>> {
    let profile = User::find_with_company(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// Update the caller's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let req = req.normalized();
    req.validate()?;

    let user = User::update_profile(&state.db, caller.user_id, req.into_update())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");

    Ok(Json(user))
}
