//! Monthly history endpoint

use super::{ApiError, AppState};
use crate::auth::Claims;
use crate::history::{group_by_month, history_cutoff, MonthSummary};
use axum::{extract::State, Extension, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub months_limit: u32,
    pub since: String,
    pub months: Vec<MonthSummary>,
}

/// GET /api/history
pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<HistoryResponse>, ApiError> {
    state.require_tip_access(&claims)?;

    let cutoff = history_cutoff(state.clock.now(), state.history_months);
    let tips = state
        .tip_store
        .list_tips_since(cutoff)
        .map_err(|e| ApiError::internal("Failed to fetch betting tips", e))?;

    Ok(Json(HistoryResponse {
        months_limit: state.history_months,
        since: cutoff.to_rfc3339(),
        months: group_by_month(tips),
    }))
}
