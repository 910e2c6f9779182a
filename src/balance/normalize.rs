//! Wager Outcome Normalizer
//!
//! Rows arrive from the tip store loosely shaped: every field may be null and
//! timestamps are free-form text. They are coerced exactly once here into a
//! [`WagerRecord`]; nothing downstream has to null-check again.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Outcome state of a wager.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    Pending,
    Win,
    Loss,
}

impl WagerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerStatus::Pending => "pending",
            WagerStatus::Win => "win",
            WagerStatus::Loss => "loss",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(WagerStatus::Pending),
            "win" => Some(WagerStatus::Win),
            "loss" => Some(WagerStatus::Loss),
            _ => None,
        }
    }

    /// Unknown or missing statuses count as unresolved.
    pub fn parse_lossy(s: Option<&str>) -> Self {
        s.and_then(Self::parse).unwrap_or(WagerStatus::Pending)
    }
}

/// A wager row as fetched from storage, before any coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawWager {
    pub id: String,
    pub provider_id: Option<String>,
    pub provider_name: Option<String>,
    pub stake: Option<f64>,
    pub realized_return: Option<f64>,
    pub status: Option<String>,
    pub event_timestamp: Option<String>,
    pub created_at: Option<String>,
}

/// Betting company a wager was placed with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderRef {
    pub id: String,
    pub name: String,
}

/// A wager after edge coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct WagerRecord {
    pub id: String,
    /// `None` when the row had no usable provider id; such wagers never
    /// reach either series.
    pub provider: Option<ProviderRef>,
    pub stake: f64,
    pub realized_return: f64,
    pub status: WagerStatus,
    pub timestamp: DateTime<Utc>,
}

impl WagerRecord {
    /// Coerce a raw row. `now` stands in for a row that has neither an
    /// event timestamp nor a creation timestamp.
    pub fn from_raw(raw: &RawWager, now: DateTime<Utc>) -> Self {
        let provider = raw
            .provider_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| ProviderRef {
                id: id.to_string(),
                name: raw
                    .provider_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(id)
                    .to_string(),
            });

        let timestamp = raw
            .event_timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| raw.created_at.as_deref().and_then(parse_timestamp))
            .unwrap_or(now);

        Self {
            id: raw.id.clone(),
            provider,
            stake: coerce_amount(raw.stake),
            realized_return: coerce_amount(raw.realized_return),
            status: WagerStatus::parse_lossy(raw.status.as_deref()),
            timestamp,
        }
    }

    /// Signed effect of this wager on its provider's balance.
    ///
    /// Pending stakes are deducted exactly like losses until the wager settles.
    pub fn profit_delta(&self) -> f64 {
        profit_delta(self.status, self.stake, self.realized_return)
    }
}

pub fn profit_delta(status: WagerStatus, stake: f64, realized_return: f64) -> f64 {
    match status {
        WagerStatus::Win => realized_return - stake,
        WagerStatus::Loss | WagerStatus::Pending => -stake,
    }
}

fn coerce_amount(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Parse the timestamp formats the store and clients produce.
///
/// Accepts RFC3339, Postgres-style `YYYY-MM-DD HH:MM:SS+00`, naive date-times
/// (read as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render a timestamp the way the balance endpoint emits dates.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
