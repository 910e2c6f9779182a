//! Per-Provider Grouper

use super::normalize::{ProviderRef, WagerRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One provider's wagers reduced to `(timestamp, profit delta)` pairs, in
/// the order they appeared in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderGroup {
    pub provider: ProviderRef,
    pub deltas: Vec<(DateTime<Utc>, f64)>,
}

/// Partition wagers by provider.
///
/// Input must already be in ascending timestamp order. Groups come back in
/// first-seen order; wagers without a provider are skipped.
pub fn group_by_provider(wagers: &[WagerRecord]) -> Vec<ProviderGroup> {
    let mut groups: Vec<ProviderGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for wager in wagers {
        let Some(provider) = &wager.provider else {
            continue;
        };

        let slot = match index.get(provider.id.as_str()) {
            Some(&i) => i,
            None => {
                groups.push(ProviderGroup {
                    provider: provider.clone(),
                    deltas: Vec::new(),
                });
                index.insert(provider.id.as_str(), groups.len() - 1);
                groups.len() - 1
            }
        };

        groups[slot]
            .deltas
            .push((wager.timestamp, wager.profit_delta()));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::normalize::WagerStatus;
    use chrono::TimeZone;

    fn wager(id: &str, provider: Option<&str>, minute: u32, stake: f64) -> WagerRecord {
        WagerRecord {
            id: id.to_string(),
            provider: provider.map(|p| ProviderRef {
                id: p.to_string(),
                name: p.to_uppercase(),
            }),
            stake,
            realized_return: 0.0,
            status: WagerStatus::Loss,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let wagers = vec![
            wager("1", Some("b"), 0, 1.0),
            wager("2", Some("a"), 1, 2.0),
            wager("3", Some("b"), 2, 3.0),
        ];

        let groups = group_by_provider(&wagers);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].provider.id, "b");
        assert_eq!(groups[0].provider.name, "B");
        assert_eq!(groups[1].provider.id, "a");

        let b: Vec<f64> = groups[0].deltas.iter().map(|(_, d)| *d).collect();
        assert_eq!(b, vec![-1.0, -3.0]);
    }

    #[test]
    fn test_providerless_wagers_are_dropped() {
        let wagers = vec![wager("1", None, 0, 5.0), wager("2", Some("a"), 1, 7.0)];

        let groups = group_by_provider(&wagers);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].deltas.len(), 1);
        assert_eq!(groups[0].deltas[0].1, -7.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_provider(&[]).is_empty());
    }
}
