//! Authentication Models
//! Users, roles and token payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: UserRole,
    pub account_active_until: Option<String>,
    pub created_at: String,
}

impl User {
    /// Subscription is active while `account_active_until` is not in the past.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.account_active_until
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|until| until.with_timezone(&Utc) >= now)
            .unwrap_or(false)
    }

    /// Betting admins always see customer content; customers need a subscription.
    pub fn can_view_tips(&self, now: DateTime<Utc>) -> bool {
        self.role == UserRole::Betting || self.is_active(now)
    }
}

/// User roles for RBAC
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    #[serde(rename = "betting")]
    Betting, // Publishes and settles tips, manages accounts
    #[serde(rename = "customer")]
    Customer, // Views tips while subscribed
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Betting => "betting",
            UserRole::Customer => "customer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "betting" => Some(UserRole::Betting),
            "customer" => Some(UserRole::Customer),
            _ => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            UserRole::Betting => "Betting Admin",
            UserRole::Customer => "Customer",
        }
    }

    pub fn can_manage_bets(&self) -> bool {
        *self == UserRole::Betting
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user_id)
    pub username: String,
    pub role: UserRole,
    pub exp: usize, // expiration timestamp
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: usize, // seconds until expiration
    pub role: UserRole,
    pub user: UserResponse,
}

/// User response (sanitized)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub role: UserRole,
    pub account_active_until: Option<String>,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            account_active_until: user.account_active_until.clone(),
            created_at: user.created_at.clone(),
        }
    }
}
