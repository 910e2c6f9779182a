//! Balance history endpoint

use super::{ApiError, AppState};
use crate::auth::Claims;
use crate::balance::BalanceHistory;
use axum::{extract::State, Extension, Json};
use tracing::debug;

/// GET /api/balance-history
///
/// Any signed-in user. A store failure aborts the request; no partial series are returned.
pub async fn get_balance_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BalanceHistory>, ApiError> {
    let wagers = state
        .tip_store
        .fetch_wagers()
        .map_err(|e| ApiError::internal("Failed to fetch betting tips", e))?;

    debug!(
        user = %claims.username,
        wagers = wagers.len(),
        "Computing balance history"
    );

    Ok(Json(state.engine.compute(&wagers)))
}
