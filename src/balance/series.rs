//! Cumulative Balance Integrator and Combined Series Merger

use super::normalize::WagerRecord;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A point on one provider's balance curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancePoint {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
    pub profit: f64,
}

/// A point on the combined balance curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedPoint {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
}

/// Left fold of profit deltas starting from `starting_balance`.
///
/// `balance[i] = balance[i - 1] + profit[i]` with `balance[-1] = starting_balance`.
pub fn integrate(deltas: &[(DateTime<Utc>, f64)], starting_balance: f64) -> Vec<BalancePoint> {
    let mut balance = starting_balance;
    deltas
        .iter()
        .map(|&(timestamp, profit)| {
            balance += profit;
            BalancePoint {
                timestamp,
                balance,
                profit,
            }
        })
        .collect()
}

/// Fold every provider-backed wager into one running balance.
///
/// The seed is `starting_balance × distinct providers`. Wagers are
/// stable-sorted by timestamp, so equal timestamps keep their input order.
pub fn merge_combined(wagers: &[WagerRecord], starting_balance: f64) -> Vec<CombinedPoint> {
    let mut stream: Vec<&WagerRecord> = wagers.iter().filter(|w| w.provider.is_some()).collect();
    if stream.is_empty() {
        return Vec::new();
    }

    let providers: HashSet<&str> = stream
        .iter()
        .filter_map(|w| w.provider.as_ref().map(|p| p.id.as_str()))
        .collect();

    stream.sort_by_key(|w| w.timestamp);

    let mut balance = starting_balance * providers.len() as f64;
    stream
        .into_iter()
        .map(|w| {
            balance += w.profit_delta();
            CombinedPoint {
                timestamp: w.timestamp,
                balance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::normalize::{ProviderRef, WagerStatus};
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap()
    }

    fn wager(provider: Option<&str>, minute: u32, status: WagerStatus, stake: f64, ret: f64) -> WagerRecord {
        WagerRecord {
            id: format!("{:?}-{}", provider, minute),
            provider: provider.map(|p| ProviderRef {
                id: p.to_string(),
                name: p.to_string(),
            }),
            stake,
            realized_return: ret,
            status,
            timestamp: ts(minute),
        }
    }

    #[test]
    fn test_integrate_running_balance() {
        let points = integrate(&[(ts(0), -100.0), (ts(1), 50.0), (ts(2), -25.0)], 1000.0);
        let balances: Vec<f64> = points.iter().map(|p| p.balance).collect();
        assert_eq!(balances, vec![900.0, 950.0, 925.0]);
        assert_eq!(points[1].profit, 50.0);
        assert_eq!(points[2].timestamp, ts(2));
    }

    #[test]
    fn test_integrate_empty() {
        assert!(integrate(&[], 1000.0).is_empty());
    }

    #[test]
    fn test_merge_seeds_with_provider_count() {
        let wagers = vec![
            wager(Some("a"), 0, WagerStatus::Win, 50.0, 120.0),
            wager(Some("b"), 1, WagerStatus::Loss, 30.0, 0.0),
        ];
        let combined = merge_combined(&wagers, 1000.0);
        let balances: Vec<f64> = combined.iter().map(|p| p.balance).collect();
        assert_eq!(balances, vec![2070.0, 2040.0]);
    }

    #[test]
    fn test_merge_sorts_by_timestamp() {
        let wagers = vec![
            wager(Some("a"), 5, WagerStatus::Loss, 10.0, 0.0),
            wager(Some("a"), 1, WagerStatus::Loss, 1.0, 0.0),
        ];
        let combined = merge_combined(&wagers, 100.0);
        assert_eq!(combined[0].timestamp, ts(1));
        assert_eq!(combined[0].balance, 99.0);
        assert_eq!(combined[1].balance, 89.0);
    }

    #[test]
    fn test_merge_keeps_input_order_on_ties() {
        let wagers = vec![
            wager(Some("a"), 0, WagerStatus::Loss, 10.0, 0.0),
            wager(Some("b"), 0, WagerStatus::Loss, 1.0, 0.0),
        ];
        let combined = merge_combined(&wagers, 0.0);
        assert_eq!(combined[0].balance, -10.0);
        assert_eq!(combined[1].balance, -11.0);
    }

    #[test]
    fn test_merge_skips_providerless() {
        let wagers = vec![
            wager(None, 0, WagerStatus::Loss, 500.0, 0.0),
            wager(Some("a"), 1, WagerStatus::Loss, 10.0, 0.0),
        ];
        let combined = merge_combined(&wagers, 1000.0);
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].balance, 990.0);
    }

    #[test]
    fn test_merge_no_providers_is_empty() {
        let wagers = vec![wager(None, 0, WagerStatus::Win, 1.0, 2.0)];
        assert!(merge_combined(&wagers, 1000.0).is_empty());
        assert!(merge_combined(&[], 1000.0).is_empty());
    }
}
