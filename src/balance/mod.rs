//! Balance History Engine
//!
//! Turns the tip ledger into notional balance curves:
//! - one curve per betting company, each seeded with the starting balance
//! - one combined curve seeded with `starting balance × company count`
//!
//! The computation is pure. The only source of "now" is the injected clock,
//! consulted for rows that carry no timestamp at all.

pub mod grouping;
pub mod normalize;
pub mod series;

pub use grouping::{group_by_provider, ProviderGroup};
pub use normalize::{parse_timestamp, ProviderRef, RawWager, WagerRecord, WagerStatus};
pub use series::{integrate, merge_combined, BalancePoint, CombinedPoint};

use crate::clock::SharedClock;
use normalize::format_timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Notional balance each betting company starts with.
pub const DEFAULT_STARTING_BALANCE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyBalancePoint {
    pub date: String,
    pub balance: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyBalance {
    pub id: String,
    pub name: String,
    pub data: Vec<CompanyBalancePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedBalancePoint {
    pub date: String,
    pub balance: f64,
}

/// Response body of `GET /api/balance-history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceHistory {
    pub companies: Vec<CompanyBalance>,
    pub combined: Vec<CombinedBalancePoint>,
}

#[derive(Clone)]
pub struct BalanceEngine {
    starting_balance: f64,
    clock: SharedClock,
}

impl BalanceEngine {
    pub fn new(starting_balance: f64, clock: SharedClock) -> Self {
        Self {
            starting_balance,
            clock,
        }
    }

    /// Coerce raw rows and put them in ascending timestamp order (stable).
    pub fn normalize(&self, rows: &[RawWager]) -> Vec<WagerRecord> {
        let now = self.clock.now();
        let mut wagers: Vec<WagerRecord> = rows
            .iter()
            .map(|row| WagerRecord::from_raw(row, now))
            .collect();
        wagers.sort_by_key(|w| w.timestamp);
        wagers
    }

    pub fn compute(&self, rows: &[RawWager]) -> BalanceHistory {
        let wagers = self.normalize(rows);

        let companies: Vec<CompanyBalance> = group_by_provider(&wagers)
            .into_iter()
            .map(|group| CompanyBalance {
                data: integrate(&group.deltas, self.starting_balance)
                    .into_iter()
                    .map(|p| CompanyBalancePoint {
                        date: format_timestamp(&p.timestamp),
                        balance: p.balance,
                        profit: p.profit,
                    })
                    .collect(),
                id: group.provider.id,
                name: group.provider.name,
            })
            .collect();

        let combined: Vec<CombinedBalancePoint> = merge_combined(&wagers, self.starting_balance)
            .into_iter()
            .map(|p| CombinedBalancePoint {
                date: format_timestamp(&p.timestamp),
                balance: p.balance,
            })
            .collect();

        debug!(
            wagers = wagers.len(),
            companies = companies.len(),
            dropped = wagers.len() - combined.len(),
            "Balance history computed"
        );

        BalanceHistory {
            companies,
            combined,
        }
    }
}
