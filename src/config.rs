//! Environment-driven configuration

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::balance::DEFAULT_STARTING_BALANCE;

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub auth_db_path: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub starting_balance: f64,
    pub history_months: u32,
    pub default_activation_days: i64,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("⚠️  JWT_SECRET not set, using development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let history_months: u32 = parse_var(&lookup, "HISTORY_MONTHS", 12)?;
        if history_months == 0 {
            anyhow::bail!("HISTORY_MONTHS must be at least 1");
        }

        let starting_balance = match lookup("STARTING_BALANCE").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_starting_balance(&raw)?,
            None => DEFAULT_STARTING_BALANCE,
        };

        Ok(Self {
            host: lookup("HOST")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 3000)?,
            db_path: resolve_data_path(lookup("DB_PATH"), "stavky.db"),
            auth_db_path: resolve_data_path(lookup("AUTH_DB_PATH"), "stavky_auth.db"),
            jwt_secret,
            jwt_expiration_hours: parse_var(&lookup, "JWT_EXPIRATION_HOURS", 24)?,
            starting_balance,
            history_months,
            default_activation_days: parse_var(&lookup, "DEFAULT_ACTIVATION_DAYS", 365)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {key}: {raw}")),
        None => Ok(default),
    }
}

/// Parse a notional starting balance. NaN and infinities are rejected since
/// every point of every curve would serialize as `null`.
pub fn parse_starting_balance(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid STARTING_BALANCE: {raw}"))?;
    if !value.is_finite() {
        anyhow::bail!("STARTING_BALANCE must be a finite number, got {raw}");
    }
    Ok(value)
}

fn default_data_path(filename: &str) -> String {
    // Anchor defaults to the crate directory
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    base.join(filename).to_string_lossy().to_string()
}

/// Resolve a database path; relative paths are anchored at the crate directory, not the cwd.
pub fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return default_data_path(default_filename);
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(p)
        .to_string_lossy()
        .to_string()
}

/// Load `.env` from the cwd (and parents), then from the crate directory.
pub fn load_env() {
    let _ = dotenv();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
