//! Betting company settings

use super::{ApiError, AppState};
use crate::auth::Claims;
use crate::models::{BettingCompany, CreateCompanyRequest};
use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::debug;

/// GET /api/settings/betting-companies
pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<BettingCompany>>, ApiError> {
    let companies = state
        .tip_store
        .list_companies()
        .map_err(|e| ApiError::internal("Failed to fetch betting companies", e))?;
    Ok(Json(companies))
}

/// POST /api/settings/betting-companies (betting only)
pub async fn create_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<BettingCompany>), ApiError> {
    state.require_betting(&claims)?;

    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing field: name".to_string()))?;

    let existing = state
        .tip_store
        .find_company_by_name(&name)
        .map_err(|e| ApiError::internal("Failed to create betting company", e))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "Betting company already exists: {name}"
        )));
    }

    let company = state
        .tip_store
        .create_company(&name)
        .map_err(|e| ApiError::internal("Failed to create betting company", e))?;

    debug!("{} added betting company {}", claims.username, company.name);
    Ok((StatusCode::CREATED, Json(company)))
}
