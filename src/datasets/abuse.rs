//! Abuse reports: who reported which address, and how many blocks followed.

use super::{Dataset, dictionary_key, parse_measure, parse_timestamp, required};
use crate::aggregate::{LeaderboardEntry, Summary, summarize, top_n};
use crate::dictionary::DictionarySet;
use crate::error::Result;
use crate::ingest::RowView;
use crate::pipeline::redaction::{Redact, redact_text, reveal_text};
use crate::secret::TokenCipher;
use serde::{Deserialize, Serialize};

pub const REPORTER: &str = "reporter";
pub const ADDRESS: &str = "address";

/// One decoded abuse report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbuseReport {
    pub reported_at: i64,
    pub reporter: String,
    pub address: String,
    pub blocks: i64,
    pub comment: String,
}

/// Normalized abuse report as stored in artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseRecord {
    pub reported_at: i64,
    /// Id in the `reporter` dictionary
    pub reporter: u32,
    /// Id in the `address` dictionary
    pub address: u32,
    pub blocks: i64,
    #[serde(default)]
    pub comment: String,
    /// Set while `comment` holds a token instead of plaintext
    #[serde(default)]
    pub redacted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbuseSummaryReport {
    pub summary: Summary,
    pub top_addresses: Vec<LeaderboardEntry>,
    pub top_reporters: Vec<LeaderboardEntry>,
    pub redacted_comments: usize,
}

impl Dataset for AbuseReport {
    type Record = AbuseRecord;
    type Report = AbuseSummaryReport;

    const NAME: &'static str = "abuse";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["reported_at", REPORTER, ADDRESS, "blocks"];
    const DICTIONARY_COLUMNS: &'static [&'static str] = &[ADDRESS, REPORTER];

    fn decode(row: &RowView<'_>) -> Option<Self> {
        Some(Self {
            reported_at: parse_timestamp(row.get("reported_at"))?,
            reporter: required(row.get(REPORTER))?.to_owned(),
            address: required(row.get(ADDRESS))?.to_owned(),
            blocks: parse_measure(row.get("blocks"))?,
            comment: row.get("comment").to_owned(),
        })
    }

    fn categorical(&self, column: &str) -> &str {
        match column {
            REPORTER => &self.reporter,
            ADDRESS => &self.address,
            _ => "",
        }
    }

    fn encode(self, dictionaries: &DictionarySet) -> Option<AbuseRecord> {
        Some(AbuseRecord {
            reported_at: self.reported_at,
            reporter: dictionaries.id(REPORTER, &self.reporter)?,
            address: dictionaries.id(ADDRESS, &self.address)?,
            blocks: self.blocks,
            comment: self.comment,
            redacted: false,
        })
    }

    fn report(records: &[AbuseRecord], dictionaries: &DictionarySet, top: usize) -> AbuseSummaryReport {
        let reporter_key = |r: &AbuseRecord| dictionary_key(dictionaries, REPORTER, r.reporter);
        let address_key = |r: &AbuseRecord| dictionary_key(dictionaries, ADDRESS, r.address);
        let blocks = |r: &AbuseRecord| r.blocks;

        AbuseSummaryReport {
            summary: summarize(records, reporter_key, blocks),
            top_addresses: top_n(records, address_key, blocks, reporter_key, top),
            top_reporters: top_n(records, reporter_key, blocks, address_key, top),
            redacted_comments: records.iter().filter(|r| r.redacted).count(),
        }
    }
}

impl Redact for AbuseRecord {
    fn redact(&mut self, cipher: Option<&TokenCipher>) -> Result<bool> {
        if self.redacted {
            return Ok(false);
        }
        let Some(token) = redact_text(&self.comment, cipher)? else {
            return Ok(false);
        };
        self.comment = token;
        self.redacted = true;
        Ok(true)
    }

    fn reveal(&mut self, cipher: &TokenCipher) -> Result<()> {
        if self.redacted {
            self.comment = reveal_text(&self.comment, cipher)?;
            self.redacted = false;
        }
        Ok(())
    }

    fn is_redacted(&self) -> bool {
        self.redacted
    }
}
