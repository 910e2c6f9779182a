//! Authentication API Endpoints
//! Login and account management

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, LoginRequest, LoginResponse, UserResponse, UserRole},
    user_store::UserStore,
};
use crate::clock::SharedClock;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
    pub clock: SharedClock,
    pub default_activation_days: i64,
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    let valid = state
        .user_store
        .verify_password(&payload.username, &payload.password)
        .map_err(AuthApiError::internal)?;

    if !valid {
        warn!("❌ Failed login attempt: {}", payload.username);
        return Err(AuthApiError::InvalidCredentials);
    }

    let user = state
        .user_store
        .get_user_by_username(&payload.username)
        .map_err(AuthApiError::internal)?
        .ok_or(AuthApiError::InvalidCredentials)?;

    let (token, expires_in) = state
        .jwt_handler
        .generate_token(&user)
        .map_err(AuthApiError::internal)?;

    info!(
        "✅ Login successful: {} ({})",
        user.username,
        user.role.as_str()
    );

    Ok(Json(LoginResponse {
        token,
        expires_in,
        role: user.role.clone(),
        user: UserResponse::from_user(&user),
    }))
}

/// Get current user info - GET /api/auth/me
pub async fn get_current_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let user = state
        .user_store
        .get_user_by_username(&claims.username)
        .map_err(AuthApiError::internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Activate request
#[derive(Debug, Deserialize)]
pub struct ActivateUserRequest {
    pub username: Option<String>,
    pub active_until: Option<String>,
}

/// Activate a customer account - POST /api/users/activate (betting only)
pub async fn activate_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ActivateUserRequest>,
) -> Result<Json<UserResponse>, AuthApiError> {
    require_betting(&state, &claims)?;

    let username = required_username(payload.username)?;

    let until = match payload.active_until.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| AuthApiError::InvalidActiveUntil)?
            .with_timezone(&Utc),
        _ => state.clock.now() + Duration::days(state.default_activation_days),
    };

    let user = state
        .user_store
        .set_active_until(&username, &until.to_rfc3339())
        .map_err(AuthApiError::internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    info!(
        "🔓 {} activated {} until {}",
        claims.username, user.username, until
    );

    Ok(Json(UserResponse::from_user(&user)))
}

/// Role change request
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub username: Option<String>,
}

/// Promote a user to the betting role - POST /api/users/set-betting-role (betting only)
pub async fn set_betting_role(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>, AuthApiError> {
    require_betting(&state, &claims)?;

    let username = required_username(payload.username)?;

    let user = state
        .user_store
        .set_role(&username, UserRole::Betting)
        .map_err(AuthApiError::internal)?
        .ok_or(AuthApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// List accounts with their subscription windows - GET /api/users (betting only)
pub async fn list_users(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserResponse>>, AuthApiError> {
    require_betting(&state, &claims)?;

    let users = state
        .user_store
        .list_users()
        .map_err(AuthApiError::internal)?;

    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// Checks the role stored for the caller, so promotions apply to tokens already issued.
fn require_betting(state: &AuthState, claims: &Claims) -> Result<(), AuthApiError> {
    let user = state
        .user_store
        .get_user_by_username(&claims.username)
        .map_err(AuthApiError::internal)?;

    match user {
        Some(user) if user.role.can_manage_bets() => Ok(()),
        _ => Err(AuthApiError::Forbidden),
    }
}

fn required_username(username: Option<String>) -> Result<String, AuthApiError> {
    username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or(AuthApiError::MissingUsername)
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    Forbidden,
    MissingUsername,
    InvalidActiveUntil,
    UserNotFound,
    InternalError,
}

impl AuthApiError {
    fn internal(err: anyhow::Error) -> Self {
        error!("Auth store failure: {:#}", err);
        AuthApiError::InternalError
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AuthApiError::MissingUsername => (StatusCode::BAD_REQUEST, "Missing field: username"),
            AuthApiError::InvalidActiveUntil => (
                StatusCode::BAD_REQUEST,
                "active_until must be an RFC3339 timestamp",
            ),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
