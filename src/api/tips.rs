//! Betting tip endpoints

use super::{ApiError, AppState};
use crate::auth::Claims;
use crate::models::{BettingTip, NewTipRequest, UpdateTipStatusRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use uuid::Uuid;

/// POST /api/betting-tips (betting only)
pub async fn create_tip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NewTipRequest>,
) -> Result<(StatusCode, Json<BettingTip>), ApiError> {
    state.require_betting(&claims)?;

    let tip = payload.validate().map_err(ApiError::BadRequest)?;

    let company = state
        .tip_store
        .get_company(&tip.betting_company_id)
        .map_err(|e| ApiError::internal("Failed to create betting tip", e))?;
    if company.is_none() {
        return Err(ApiError::NotFound(format!(
            "Betting company not found: {}",
            tip.betting_company_id
        )));
    }

    let created = state
        .tip_store
        .create_tip(&tip, &claims.username)
        .map_err(|e| ApiError::internal("Failed to create betting tip", e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/betting-tips/:id (betting only)
pub async fn update_tip_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTipStatusRequest>,
) -> Result<Json<BettingTip>, ApiError> {
    state.require_betting(&claims)?;

    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::BadRequest(format!("Invalid tip ID: {id}")));
    }

    let status = payload
        .settled_status()
        .ok_or_else(|| ApiError::BadRequest("Invalid status value.".to_string()))?;

    let updated = state
        .tip_store
        .update_tip_status(&id, status)
        .map_err(|e| ApiError::internal("Failed to update betting tip", e))?;
    if !updated {
        return Err(ApiError::NotFound(format!("Tip not found: {id}")));
    }

    let tip = state
        .tip_store
        .get_tip(&id)
        .map_err(|e| ApiError::internal("Failed to update betting tip", e))?
        .ok_or_else(|| ApiError::NotFound(format!("Tip not found: {id}")))?;

    info!(
        "🎯 Tip {} settled as {} by {}",
        tip.id,
        status.as_str(),
        claims.username
    );
    Ok(Json(tip))
}

/// GET /api/betting-tips/active
///
/// Pending tips, soonest match first. Customers need a running subscription.
pub async fn list_active_tips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BettingTip>>, ApiError> {
    state.require_tip_access(&claims)?;

    let tips = state
        .tip_store
        .list_pending_tips()
        .map_err(|e| ApiError::internal("Failed to fetch betting tips", e))?;
    Ok(Json(tips))
}
