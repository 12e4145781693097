//! Dataset definitions: how raw rows decode, which columns are
//! dictionary-encoded and what a report over the normalized records contains.
//!
//! A dataset is a zero-sized description plus two typed row shapes. The
//! decoded row keeps categorical values as text; the normalized record holds
//! dictionary ids instead.
//!
//! - [`abuse`]: abuse reports ranked by reported address
//! - [`downloads`]: download logs broken down by country and version

pub mod abuse;
pub mod downloads;

pub use abuse::{AbuseRecord, AbuseReport, AbuseSummaryReport};
pub use downloads::{Download, DownloadRecord, DownloadSummaryReport};

use crate::dictionary::DictionarySet;
use crate::ingest::RowView;
use crate::pipeline::redaction::Redact;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A kind of export that can be normalized, packed and reported on.
pub trait Dataset: Sized {
    /// Normalized form stored in artifacts.
    type Record: Serialize + DeserializeOwned + Redact + Clone + std::fmt::Debug;

    /// Aggregated view over a batch of records.
    type Report: Serialize + std::fmt::Debug;

    /// Short identifier used for artifact names and log fields.
    const NAME: &'static str;

    /// Columns that must be present in every input table.
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Columns replaced by dictionary ids.
    const DICTIONARY_COLUMNS: &'static [&'static str];

    /// Decode one raw row. `None` drops the row.
    fn decode(row: &RowView<'_>) -> Option<Self>;

    /// Trimmed text of a dictionary-encoded column.
    fn categorical(&self, column: &str) -> &str;

    /// Replace categorical text by ids. `None` drops the row.
    fn encode(self, dictionaries: &DictionarySet) -> Option<Self::Record>;

    fn report(records: &[Self::Record], dictionaries: &DictionarySet, top: usize) -> Self::Report;
}

/// Parse a timestamp cell into seconds since the Unix epoch (UTC).
///
/// Accepts integer epoch seconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DD`. Blank or unrecognized cells give `None`.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(seconds) = raw.parse::<i64>() {
        return Some(seconds);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
}

/// Parse an integer measure. Blank counts as zero; anything else that is not
/// an integer gives `None`.
pub fn parse_measure(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        Some(0)
    } else {
        raw.parse().ok()
    }
}

/// `Some(raw)` unless the trimmed cell is blank.
pub fn required(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    (!raw.is_empty()).then_some(raw)
}

/// Look up the text behind a dictionary id, falling back to the id itself.
pub(crate) fn dictionary_key(
    dictionaries: &DictionarySet,
    column: &str,
    id: u32,
) -> crate::aggregate::AggregateKey {
    dictionaries
        .value(column, id)
        .map_or_else(|| id.into(), Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(parse_timestamp("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_timestamp("2023-11-14T22:13:20Z"), Some(1_700_000_000));
        assert_eq!(
            parse_timestamp("2023-11-14T23:13:20+01:00"),
            Some(1_700_000_000)
        );
        assert_eq!(parse_timestamp("2023-11-14 22:13:20"), Some(1_700_000_000));
        assert_eq!(parse_timestamp("1970-01-02"), Some(86_400));
    }

    #[test]
    fn test_timestamp_rejects() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2023-13-40"), None);
    }

    #[test]
    fn test_measure() {
        assert_eq!(parse_measure(""), Some(0));
        assert_eq!(parse_measure(" 42 "), Some(42));
        assert_eq!(parse_measure("-3"), Some(-3));
        assert_eq!(parse_measure("4.5"), None);
        assert_eq!(parse_measure("many"), None);
    }

    #[test]
    fn test_required() {
        assert_eq!(required("  alice "), Some("alice"));
        assert_eq!(required(" \t "), None);
    }
}
