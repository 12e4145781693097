//! Download logs: where a release was fetched from and how much was served.

use super::{Dataset, dictionary_key, parse_measure, parse_timestamp, required};
use crate::aggregate::{AggregateKey, Breakdown, LeaderboardEntry, Summary, breakdown, summarize, top_n};
use crate::dictionary::DictionarySet;
use crate::ingest::RowView;
use crate::pipeline::redaction::Redact;
use serde::{Deserialize, Serialize};

pub const COUNTRY: &str = "country";
pub const VERSION: &str = "version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub downloaded_at: i64,
    pub country: String,
    pub version: String,
    pub client_id: String,
    pub bytes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub downloaded_at: i64,
    pub country: u32,
    pub version: u32,
    pub client_id: String,
    pub bytes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSummaryReport {
    pub summary: Summary,
    pub countries: Breakdown,
    pub top_versions: Vec<LeaderboardEntry>,
}

impl Dataset for Download {
    type Record = DownloadRecord;
    type Report = DownloadSummaryReport;

    const NAME: &'static str = "downloads";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["downloaded_at", COUNTRY, VERSION, "client_id"];
    const DICTIONARY_COLUMNS: &'static [&'static str] = &[COUNTRY, VERSION];

    fn decode(row: &RowView<'_>) -> Option<Self> {
        Some(Self {
            downloaded_at: parse_timestamp(row.get("downloaded_at"))?,
            country: required(row.get(COUNTRY))?.to_owned(),
            version: required(row.get(VERSION))?.to_owned(),
            client_id: required(row.get("client_id"))?.to_owned(),
            bytes: parse_measure(row.get("bytes"))?,
        })
    }

    fn categorical(&self, column: &str) -> &str {
        match column {
            COUNTRY => &self.country,
            VERSION => &self.version,
            _ => "",
        }
    }

    fn encode(self, dictionaries: &DictionarySet) -> Option<DownloadRecord> {
        Some(DownloadRecord {
            downloaded_at: self.downloaded_at,
            country: dictionaries.id(COUNTRY, &self.country)?,
            version: dictionaries.id(VERSION, &self.version)?,
            client_id: self.client_id,
            bytes: self.bytes,
        })
    }

    fn report(
        records: &[DownloadRecord],
        dictionaries: &DictionarySet,
        top: usize,
    ) -> DownloadSummaryReport {
        let client = |r: &DownloadRecord| AggregateKey::text(&r.client_id);
        let bytes = |r: &DownloadRecord| r.bytes;

        DownloadSummaryReport {
            summary: summarize(records, client, bytes),
            countries: breakdown(records, |r| dictionary_key(dictionaries, COUNTRY, r.country))
                .truncated(top),
            top_versions: top_n(
                records,
                |r| dictionary_key(dictionaries, VERSION, r.version),
                bytes,
                client,
                top,
            ),
        }
    }
}

// Download logs carry no free text.
impl Redact for DownloadRecord {}
