//! Grouped top-N rankings.

use super::{AggregateKey, clamp_sum, round2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// One ranked group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub key: AggregateKey,
    pub occurrences: u64,
    pub measure_sum: i64,
    /// Distinct actors that contributed to this group
    pub reporters: usize,
    pub average_measure_per_occurrence: f64,
}

#[derive(Default)]
struct Accumulator {
    occurrences: u64,
    measure_sum: i128,
    actors: HashSet<AggregateKey>,
}

impl Accumulator {
    fn add(&mut self, measure: i64, actor: AggregateKey) {
        self.occurrences += 1;
        self.measure_sum += i128::from(measure);
        self.actors.insert(actor);
    }

    fn into_entry(self, key: AggregateKey) -> LeaderboardEntry {
        let average = if self.occurrences == 0 {
            0.0
        } else {
            round2(self.measure_sum as f64 / self.occurrences as f64)
        };
        LeaderboardEntry {
            key,
            occurrences: self.occurrences,
            measure_sum: clamp_sum(self.measure_sum),
            reporters: self.actors.len(),
            average_measure_per_occurrence: average,
        }
    }
}

/// Ranking order: measure sum desc, then occurrences desc, then key asc.
///
/// Keys are unique per leaderboard, so this is a total order.
fn rank(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.measure_sum
        .cmp(&a.measure_sum)
        .then_with(|| b.occurrences.cmp(&a.occurrences))
        .then_with(|| a.key.cmp(&b.key))
}

/// Group records, rank the groups and keep the first `n`.
///
/// The result depends only on the multiset of records, never on their order.
pub fn top_n<R, G, GK, M, A, AK>(
    records: &[R],
    group: G,
    measure: M,
    actor: A,
    n: usize,
) -> Vec<LeaderboardEntry>
where
    G: Fn(&R) -> GK,
    GK: Into<AggregateKey>,
    M: Fn(&R) -> i64,
    A: Fn(&R) -> AK,
    AK: Into<AggregateKey>,
{
    let mut groups: HashMap<AggregateKey, Accumulator> = HashMap::new();
    for record in records {
        groups
            .entry(group(record).into())
            .or_default()
            .add(measure(record), actor(record).into());
    }

    let mut entries: Vec<LeaderboardEntry> = groups
        .into_iter()
        .map(|(key, acc)| acc.into_entry(key))
        .collect();
    entries.sort_by(rank);
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Report {
        reporter: &'static str,
        address: &'static str,
        blocks: i64,
    }

    fn report(reporter: &'static str, address: &'static str, blocks: i64) -> Report {
        Report {
            reporter,
            address,
            blocks,
        }
    }

    fn by_address(records: &[Report], n: usize) -> Vec<LeaderboardEntry> {
        top_n(records, |r| r.address, |r| r.blocks, |r| r.reporter, n)
    }

    #[test]
    fn test_ranked_by_measure_then_count() {
        let records = [
            report("alice", "a@x.com", 1),
            report("alice", "b@x.com", 5),
            report("bob", "c@x.com", 2),
            report("carol", "c@x.com", 3),
        ];
        let board = by_address(&records, 10);
        let keys: Vec<String> = board.iter().map(|e| e.key.to_string()).collect();
        // b and c both sum to 5; c has two occurrences
        assert_eq!(keys, ["c@x.com", "b@x.com", "a@x.com"]);
        assert_eq!(board[0].reporters, 2);
        assert_eq!(board[0].average_measure_per_occurrence, 2.5);
    }

    #[test]
    fn test_full_tie_breaks_alphabetically() {
        let records = [
            report("alice", "b@x.com", 3),
            report("alice", "b@x.com", 3),
            report("bob", "a@x.com", 2),
            report("bob", "a@x.com", 4),
            report("bob", "c@x.com", 2),
            report("bob", "c@x.com", 1),
        ];
        let board = by_address(&records, 10);
        let keys: Vec<String> = board.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, ["a@x.com", "b@x.com", "c@x.com"]);
        assert_eq!(board[2].measure_sum, 3);
        assert_eq!(board[2].average_measure_per_occurrence, 1.5);
    }

    #[test]
    fn test_grouping_is_case_insensitive() {
        let records = [
            report("alice", "Spam@X.com", 1),
            report("bob", "spam@x.com", 1),
        ];
        let board = by_address(&records, 10);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].key, AggregateKey::from("spam@x.com"));
        assert_eq!(board[0].occurrences, 2);
    }

    #[test]
    fn test_truncates_after_sorting() {
        let records = [
            report("a", "low@x.com", 1),
            report("a", "high@x.com", 9),
            report("a", "mid@x.com", 5),
        ];
        let board = by_address(&records, 2);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].key.to_string(), "high@x.com");
        assert_eq!(board[1].key.to_string(), "mid@x.com");
    }

    #[test]
    fn test_reversed_input_same_result() {
        let mut records = vec![
            report("alice", "b@x.com", 3),
            report("bob", "a@x.com", 3),
            report("carol", "c@x.com", 1),
            report("dave", "a@x.com", 0),
        ];
        let forward = by_address(&records, 10);
        records.reverse();
        assert_eq!(by_address(&records, 10), forward);
    }

    #[test]
    fn test_sum_near_i64_bounds() {
        let records = [
            report("alice", "big@x.com", i64::MAX),
            report("bob", "big@x.com", 1),
            report("carol", "small@x.com", 1),
        ];
        let board = by_address(&records, 10);
        assert_eq!(board[0].key.to_string(), "big@x.com");
        assert_eq!(board[0].measure_sum, i64::MAX);
        assert_eq!(board[1].measure_sum, 1);

        let records = [
            report("alice", "big@x.com", i64::MAX),
            report("bob", "big@x.com", 1),
            report("carol", "big@x.com", -2),
        ];
        assert_eq!(by_address(&records, 1)[0].measure_sum, i64::MAX - 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(by_address(&[], 5).is_empty());
    }
}
