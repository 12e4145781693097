//! Summary statistics and deterministic leaderboards over normalized records.
//!
//! Every function here is a pure pass over a slice of records. Callers supply
//! closures that pick the grouping key, the actor key and the numeric measure,
//! so the same code ranks abuse reports by address and downloads by version.
//!
//! ```
//! use datapress::aggregate::top_n;
//!
//! // (address, reporter, blocks)
//! let reports = [("b@x.com", "alice", 3), ("a@x.com", "bob", 3), ("b@x.com", "bob", 1)];
//! let board = top_n(&reports, |r| r.0, |r| r.2, |r| r.1, 10);
//!
//! assert_eq!(board[0].key.to_string(), "b@x.com");
//! assert_eq!(board[0].measure_sum, 4);
//! assert_eq!(board[0].reporters, 2);
//! ```
//!
//! Measures are integers so that sums do not depend on the order records are
//! visited in.
//!
//! ## Architecture
//!
//! - [`summary`]: totals and distinct actors
//! - [`leaderboard`]: grouped top-N ranking
//! - [`breakdown`]: per-category percentages

pub mod breakdown;
pub mod leaderboard;
pub mod summary;

pub use breakdown::{Breakdown, Share, breakdown};
pub use leaderboard::{LeaderboardEntry, top_n};
pub use summary::{Summary, summarize};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping or actor key. Text keys are trimmed and lowercased on
/// construction, which makes grouping case-insensitive.
///
/// Ordering puts every id before every text key; within a kind, ids sort
/// numerically and text sorts by bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregateKey {
    Id(u64),
    Text(String),
}

impl AggregateKey {
    pub fn text(raw: &str) -> Self {
        Self::Text(raw.trim().to_lowercase())
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for AggregateKey {
    fn from(raw: &str) -> Self {
        Self::text(raw)
    }
}

impl From<String> for AggregateKey {
    fn from(raw: String) -> Self {
        Self::text(&raw)
    }
}

impl From<&String> for AggregateKey {
    fn from(raw: &String) -> Self {
        Self::text(raw)
    }
}

impl From<u32> for AggregateKey {
    fn from(id: u32) -> Self {
        Self::Id(u64::from(id))
    }
}

impl From<u64> for AggregateKey {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Narrow a wide measure sum to `i64`, clamping at the bounds.
///
/// Sums accumulate in `i128` so they stay exact and order-independent for
/// any input an `i64` measure can produce.
pub(crate) fn clamp_sum(sum: i128) -> i64 {
    i64::try_from(sum).unwrap_or(if sum < 0 { i64::MIN } else { i64::MAX })
}
