//! HTTP surface
//!
//! - `GET  /health`
//! - `POST /api/auth/login`
//! - `GET  /api/auth/me`
//! - `GET  /api/users`, `POST /api/users/activate`, `POST /api/users/set-betting-role`
//! - `GET|POST /api/settings/betting-companies`
//! - `POST /api/betting-tips`, `PATCH /api/betting-tips/:id`, `GET /api/betting-tips/active`
//! - `GET  /api/balance-history`
//! - `GET  /api/history`

pub mod balance;
pub mod companies;
pub mod error;
pub mod history;
pub mod tips;

pub use error::ApiError;

use crate::auth::{api as auth_api, auth_middleware, AuthState, Claims, User};
use crate::balance::BalanceEngine;
use crate::clock::SharedClock;
use crate::middleware::request_logging_simple;
use crate::storage::TipStore;
use axum::{
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared by the tip, company and balance handlers
#[derive(Clone)]
pub struct AppState {
    pub tip_store: Arc<TipStore>,
    pub auth: AuthState,
    pub engine: BalanceEngine,
    pub clock: SharedClock,
    pub history_months: u32,
}

impl AppState {
    pub fn new(
        tip_store: Arc<TipStore>,
        auth: AuthState,
        starting_balance: f64,
        history_months: u32,
    ) -> Self {
        let clock = auth.clock.clone();
        Self {
            tip_store,
            engine: BalanceEngine::new(starting_balance, clock.clone()),
            clock,
            auth,
            history_months,
        }
    }

    /// Load the caller's account; a token for a deleted user is treated as unauthenticated.
    pub(crate) fn current_user(&self, claims: &Claims) -> Result<User, ApiError> {
        self.auth
            .user_store
            .get_user_by_username(&claims.username)
            .map_err(|e| ApiError::internal("Failed to load user", e))?
            .ok_or(ApiError::Unauthorized)
    }

    /// Betting admins, or customers whose subscription is still running.
    pub(crate) fn require_tip_access(&self, claims: &Claims) -> Result<User, ApiError> {
        let user = self.current_user(claims)?;
        if user.can_view_tips(self.clock.now()) {
            Ok(user)
        } else {
            Err(ApiError::SubscriptionRequired)
        }
    }

    /// The stored role decides, not the one baked into the token.
    pub(crate) fn require_betting(&self, claims: &Claims) -> Result<User, ApiError> {
        let user = self.current_user(claims)?;
        if user.role.can_manage_bets() {
            Ok(user)
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Health check - GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
    let jwt_handler = state.auth.jwt_handler.clone();
    let auth_state = state.auth.clone();

    let auth_router = Router::new()
        .route("/api/auth/login", post(auth_api::login))
        .with_state(auth_state.clone());

    let protected_auth_routes = Router::new()
        .route("/api/auth/me", get(auth_api::get_current_user))
        .route("/api/users/activate", post(auth_api::activate_user))
        .route("/api/users/set-betting-role", post(auth_api::set_betting_role))
        .route("/api/users", get(auth_api::list_users))
        .route_layer(middleware::from_fn_with_state(
            jwt_handler.clone(),
            auth_middleware,
        ))
        .with_state(auth_state);

    let protected_routes = Router::new()
        .route("/api/balance-history", get(balance::get_balance_history))
        .route("/api/history", get(history::get_history))
        .route(
            "/api/settings/betting-companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route("/api/betting-tips", post(tips::create_tip))
        .route("/api/betting-tips/active", get(tips::list_active_tips))
        .route("/api/betting-tips/:id", patch(tips::update_tip_status))
        .route_layer(middleware::from_fn_with_state(jwt_handler, auth_middleware))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_router)
        .merge(protected_auth_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging_simple))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
