//! Per-category share of the record set.

use super::{AggregateKey, round2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub key: AggregateKey,
    pub count: u64,
    /// Percent of `Breakdown::total`, rounded to two decimals
    pub percentage: f64,
}

/// Category counts with percentages relative to the whole record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub total: u64,
    pub shares: Vec<Share>,
}

impl Breakdown {
    /// The first `n` shares. Percentages still refer to the full total.
    pub fn top(&self, n: usize) -> &[Share] {
        &self.shares[..n.min(self.shares.len())]
    }

    /// Drop all but the first `n` shares, keeping `total`.
    #[must_use]
    pub fn truncated(mut self, n: usize) -> Self {
        self.shares.truncate(n);
        self
    }
}

/// Count records per category, largest first (ties by key).
pub fn breakdown<R, C, K>(records: &[R], category: C) -> Breakdown
where
    C: Fn(&R) -> K,
    K: Into<AggregateKey>,
{
    let mut counts: HashMap<AggregateKey, u64> = HashMap::new();
    for record in records {
        *counts.entry(category(record).into()).or_default() += 1;
    }

    let total = records.len() as u64;
    let mut shares: Vec<Share> = counts
        .into_iter()
        .map(|(key, count)| Share {
            key,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                round2(count as f64 / total as f64 * 100.0)
            },
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

    Breakdown { total, shares }
}
