/// Company endpoints
///
/// # Endpoints
///
/// - `GET /api/companies?page=&limit=&search=` - Paged listing with users
/// - `GET /api/companies/:id` - One company with its documents
/// - `DELETE /api/companies/:id` - Soft delete (admins of that company only)
///
/// All require a bearer token.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use onboard_shared::{
    auth::middleware::AuthContext,
    models::{
        company::{Company, CompanyDetails, CompanyQuery, CompanyWithUsers},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Listing query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListCompaniesParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

/// Listing response
#[derive(Debug, Serialize)]
pub struct ListCompaniesResponse {
    pub companies: Vec<CompanyWithUsers>,

    /// Companies matching the filter across all pages
    pub total: i64,

    pub page: u32,

    pub limit: u32,
}

/// List companies, newest first
///
/// `page` defaults to 1, `limit` to 10 (at most 100). `search` matches name or
/// industry, case-insensitively.
pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<ListCompaniesParams>,
) -> ApiResult<Json<ListCompaniesResponse>> {
    let query = CompanyQuery::new(params.page, params.limit, params.search);
    let page = Company::list(&state.db, &query).await?;

    Ok(Json(ListCompaniesResponse {
        companies: page.companies,
        total: page.total,
        page: query.page,
        limit: query.limit,
    }))
}

/// Get one company with its documents
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CompanyDetails>> {
    let company = Company::find_with_documents(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    Ok(Json(company))
}

/// Soft-delete a company with its users and documents
///
/// # Errors
///
/// - `404 Not Found`: No such company, or it is already deleted
/// - `403 Forbidden`: Caller isn't an admin of this company
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if Company::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Company not found".to_string()));
    }

    let user = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    if user.company_id != id || !user.is_admin() {
        return Err(ApiError::Forbidden(
            "Only an admin of this company can delete it".to_string(),
        ));
    }

    if !Company::soft_delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Company not found".to_string()));
    }

    info!(company_id = %id, deleted_by = %user.id, "Company soft-deleted");

    Ok(StatusCode::NO_CONTENT)
}
