//! Monthly win/loss history
//!
//! Groups settled and pending tips by calendar month (UTC) of their match date.

use crate::balance::{parse_timestamp, WagerStatus};
use crate::models::BettingTip;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthSummary {
    /// `YYYY-MM`
    pub month: String,
    pub wins: u32,
    pub losses: u32,
    pub pending: u32,
    pub total: u32,
    pub success_rate: f64,
    pub tips: Vec<BettingTip>,
}

/// First instant of the month `months - 1` months before `now`.
///
/// `months == 1` means "this month only".
pub fn history_cutoff(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let back = months.saturating_sub(1) as i32;
    let index = now.year() * 12 + now.month0() as i32 - back;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;

    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Success rate over decided tips, in percent.
pub fn success_rate(wins: u32, losses: u32) -> f64 {
    let decided = wins + losses;
    if decided == 0 {
        0.0
    } else {
        wins as f64 / decided as f64 * 100.0
    }
}

/// Group tips into months, newest month first, tips inside a month newest first.
///
/// Tips whose match date cannot be parsed are skipped.
pub fn group_by_month(tips: Vec<BettingTip>) -> Vec<MonthSummary> {
    let mut months: BTreeMap<String, Vec<(DateTime<Utc>, BettingTip)>> = BTreeMap::new();
    let mut skipped = 0usize;

    for tip in tips {
        let Some(ts) = parse_timestamp(&tip.match_date) else {
            skipped += 1;
            continue;
        };
        let key = format!("{:04}-{:02}", ts.year(), ts.month());
        months.entry(key).or_default().push((ts, tip));
    }

    if skipped > 0 {
        debug!("History skipped {} tips without a usable match date", skipped);
    }

    months
        .into_iter()
        .rev()
        .map(|(month, mut entries)| {
            entries.sort_by(|a, b| b.0.cmp(&a.0));

            let mut wins = 0;
            let mut losses = 0;
            let mut pending = 0;
            for (_, tip) in &entries {
                match tip.status {
                    WagerStatus::Win => wins += 1,
                    WagerStatus::Loss => losses += 1,
                    WagerStatus::Pending => pending += 1,
                }
            }

            MonthSummary {
                month,
                wins,
                losses,
                pending,
                total: entries.len() as u32,
                success_rate: success_rate(wins, losses),
                tips: entries.into_iter().map(|(_, tip)| tip).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tip(id: &str, match_date: &str, status: WagerStatus) -> BettingTip {
        BettingTip {
            id: id.to_string(),
            betting_company_id: "c1".to_string(),
            company_name: Some("Tipsport".to_string()),
            sport: "football".to_string(),
            league: "Fortuna liga".to_string(),
            match_name: "Sparta - Slavia".to_string(),
            odds: 1.5,
            stake: Some(100.0),
            total_win: Some(150.0),
            match_date: match_date.to_string(),
            status,
            created_by: None,
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_cutoff() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 10, 30, 0).unwrap();
        assert_eq!(
            history_cutoff(now, 12),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            history_cutoff(now, 1),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            history_cutoff(now, 3),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            history_cutoff(now, 4),
            Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(3, 1), 75.0);
        assert_eq!(success_rate(0, 2), 0.0);
    }

    #[test]
    fn test_group_by_month() {
        let months = group_by_month(vec![
            tip("a", "2025-01-10T18:00:00+00:00", WagerStatus::Win),
            tip("b", "2025-02-03T18:00:00+00:00", WagerStatus::Loss),
            tip("c", "2025-01-20T18:00:00+00:00", WagerStatus::Loss),
            tip("d", "2025-01-25T18:00:00+00:00", WagerStatus::Pending),
            tip("e", "2025-01-05T18:00:00+00:00", WagerStatus::Win),
        ]);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2025-02");
        assert_eq!(months[0].losses, 1);
        assert_eq!(months[0].success_rate, 0.0);

        let january = &months[1];
        assert_eq!(january.month, "2025-01");
        assert_eq!(
            (january.wins, january.losses, january.pending, january.total),
            (2, 1, 1, 4)
        );
        let ids: Vec<&str> = january.tips.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "a", "e"]);
    }

    #[test]
    fn test_month_boundary_uses_utc() {
        let months = group_by_month(vec![tip(
            "late",
            "2025-01-31T23:30:00-02:00",
            WagerStatus::Win,
        )]);
        assert_eq!(months[0].month, "2025-02");
    }

    #[test]
    fn test_empty_and_unparseable() {
        assert!(group_by_month(Vec::new()).is_empty());
        assert!(group_by_month(vec![tip("x", "", WagerStatus::Win)]).is_empty());
    }
}
