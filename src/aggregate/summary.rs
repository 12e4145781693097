//! Whole-dataset totals.

use super::{AggregateKey, clamp_sum};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of records
    pub total: u64,

    /// Distinct actors (text compared case-insensitively)
    pub distinct_actors: usize,

    /// Sum of the measure over all records, clamped to the `i64` range
    pub measure_sum: i64,

    /// Records whose measure is exactly zero
    pub zero_measure: u64,
}

/// Totals, distinct actors, measure sum and zero-measure count.
pub fn summarize<R, A, K, M>(records: &[R], actor: A, measure: M) -> Summary
where
    A: Fn(&R) -> K,
    K: Into<AggregateKey>,
    M: Fn(&R) -> i64,
{
    let mut actors: HashSet<AggregateKey> = HashSet::new();
    let mut summary = Summary::default();
    let mut sum: i128 = 0;

    for record in records {
        let value = measure(record);
        summary.total += 1;
        sum += i128::from(value);
        if value == 0 {
            summary.zero_measure += 1;
        }
        actors.insert(actor(record).into());
    }

    summary.measure_sum = clamp_sum(sum);
    summary.distinct_actors = actors.len();
    summary
}
