//! Tip and betting company data models

use crate::balance::{parse_timestamp, WagerStatus};
use serde::{Deserialize, Serialize};

/// Lowest odds the tip form accepts.
pub const MIN_ODDS: f64 = 1.001;
/// Highest odds the tip form accepts.
pub const MAX_ODDS: f64 = 2.0;

/// Bookmaker a tip is placed with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BettingCompany {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// A published betting tip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BettingTip {
    pub id: String,
    pub betting_company_id: String,
    pub company_name: Option<String>,
    pub sport: String,
    pub league: String,
    #[serde(rename = "match")]
    pub match_name: String,
    pub odds: f64,
    pub stake: Option<f64>,
    pub total_win: Option<f64>,
    pub match_date: String,
    pub status: WagerStatus,
    pub created_by: Option<String>,
    pub created_at: String,
}

/// Body of `POST /api/betting-tips`.
///
/// Every field is optional at the serde level so a missing field can be
/// reported by name instead of as a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewTipRequest {
    pub betting_company_id: Option<String>,
    pub sport: Option<String>,
    pub league: Option<String>,
    #[serde(rename = "match")]
    pub match_name: Option<String>,
    pub odds: Option<f64>,
    pub match_date: Option<String>,
    pub stake: Option<f64>,
    pub total_win: Option<f64>,
}

/// A validated tip ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTip {
    pub betting_company_id: String,
    pub sport: String,
    pub league: String,
    pub match_name: String,
    pub odds: f64,
    pub match_date: String,
    pub stake: Option<f64>,
    pub total_win: Option<f64>,
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("Missing field: {}", field))
}

impl NewTipRequest {
    pub fn validate(self) -> Result<NewTip, String> {
        let betting_company_id = required(self.betting_company_id, "betting_company_id")?;
        let sport = required(self.sport, "sport")?;
        let league = required(self.league, "league")?;
        let match_name = required(self.match_name, "match")?;
        let odds = self.odds.ok_or_else(|| "Missing field: odds".to_string())?;
        let match_date = required(self.match_date, "match_date")?;

        if !odds.is_finite() || !(MIN_ODDS..=MAX_ODDS).contains(&odds) {
            return Err(format!(
                "Odds must be between {} and {}, got {}",
                MIN_ODDS, MAX_ODDS, odds
            ));
        }

        let parsed_date = parse_timestamp(&match_date)
            .ok_or_else(|| format!("Invalid match_date: {}", match_date))?;

        for (name, value) in [("stake", self.stake), ("total_win", self.total_win)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{} must be a non-negative number", name));
                }
            }
        }

        let total_win = match (self.stake, self.total_win) {
            (_, Some(explicit)) => Some(explicit),
            (Some(stake), None) => Some(stake * odds),
            (None, None) => None,
        };

        Ok(NewTip {
            betting_company_id,
            sport,
            league,
            match_name,
            odds,
            match_date: parsed_date.to_rfc3339(),
            stake: self.stake,
            total_win,
        })
    }
}

/// Body of `PATCH /api/betting-tips/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTipStatusRequest {
    pub status: Option<String>,
}

impl UpdateTipStatusRequest {
    /// Only settled outcomes may be written; a tip is never reset to pending.
    pub fn settled_status(&self) -> Option<WagerStatus> {
        match self.status.as_deref().and_then(WagerStatus::parse) {
            Some(s @ (WagerStatus::Win | WagerStatus::Loss)) => Some(s),
            _ => None,
        }
    }
}

/// Body of `POST /api/settings/betting-companies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: Option<String>,
}
