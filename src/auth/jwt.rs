//! JWT Token Handler
//! Session tokens for the dashboard, issued and checked against the service clock

use crate::auth::models::{Claims, User};
use crate::clock::SharedClock;
use anyhow::{bail, Context, Result};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Issues HS256 session tokens and validates them.
///
/// Expiry is judged by the injected clock rather than by `jsonwebtoken`'s
/// wall-clock check, so a frozen clock freezes token lifetimes too.
pub struct JwtHandler {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
    clock: SharedClock,
}

impl JwtHandler {
    pub fn new(secret: &str, clock: SharedClock) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::hours(24),
            clock,
        }
    }

    pub fn with_expiration_hours(mut self, hours: i64) -> Self {
        self.lifetime = Duration::hours(hours);
        self
    }

    /// Token for `user` plus its lifetime in seconds.
    pub fn generate_token(&self, user: &User) -> Result<(String, usize)> {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.lifetime)
            .context("Token expiry out of range")?;
        let exp = usize::try_from(expires_at.timestamp()).context("Token expiry before epoch")?;
        let expires_in =
            usize::try_from(self.lifetime.num_seconds()).context("Negative token lifetime")?;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign token")?;

        debug!("Issued token for {} until {}", user.username, expires_at);
        Ok((token, expires_in))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .context("Invalid token")?
            .claims;

        let now = self.clock.now().timestamp();
        if i64::try_from(claims.exp).map_or(true, |exp| exp <= now) {
            bail!("Token for {} expired", claims.username);
        }

        Ok(claims)
    }
}
