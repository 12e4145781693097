//! Two-pass normalization of one batch of raw tables.
//!
//! Pass 1 collects the distinct values of every dictionary column across all
//! tables. Pass 2 decodes each row again and replaces those values with ids.
//! Only rows that decode cleanly contribute to the dictionaries, so a row
//! dropped for a bad timestamp never claims an id.

use crate::datasets::Dataset;
use crate::dictionary::{DictionaryBuilder, DictionarySet};
use crate::error::Result;
use crate::ingest::RawTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output of one normalization run.
///
/// Dictionaries are written to their own files, so they are skipped when the
/// batch itself is serialized into an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalized<R> {
    pub run_id: Uuid,
    pub dataset: String,
    pub created_utc: DateTime<Utc>,
    #[serde(skip)]
    pub dictionaries: DictionarySet,
    pub records: Vec<R>,
    /// Rows excluded because a required field was blank or malformed
    pub dropped: usize,
}

impl<R> Normalized<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize every table of a batch with shared dictionaries.
///
/// # Errors
///
/// [`crate::error::DatapressError::MissingColumns`] when any table lacks a
/// required column; checked for all tables before any row is read.
pub fn normalize<D: Dataset>(tables: &[RawTable]) -> Result<Normalized<D::Record>> {
    for table in tables {
        table.require_columns(D::NAME, D::REQUIRED_COLUMNS)?;
    }

    let dictionaries = build_dictionaries::<D>(tables);

    let mut records = Vec::new();
    let mut dropped = 0;
    for table in tables {
        let before = records.len();
        let mut table_dropped = 0;
        for row in table.rows() {
            match D::decode(&row).and_then(|decoded| decoded.encode(&dictionaries)) {
                Some(record) => records.push(record),
                None => table_dropped += 1,
            }
        }
        tracing::debug!(
            dataset = D::NAME,
            source = table.source(),
            kept = records.len() - before,
            dropped = table_dropped,
            "normalized table"
        );
        dropped += table_dropped;
    }

    let run_id = Uuid::new_v4();
    tracing::info!(
        dataset = D::NAME,
        %run_id,
        tables = tables.len(),
        records = records.len(),
        dropped,
        "normalization complete"
    );

    Ok(Normalized {
        run_id,
        dataset: D::NAME.to_owned(),
        created_utc: Utc::now(),
        dictionaries,
        records,
        dropped,
    })
}

/// Pass 1: dictionaries over every decodable row of the batch.
pub fn build_dictionaries<D: Dataset>(tables: &[RawTable]) -> DictionarySet {
    let mut builders: Vec<(&str, DictionaryBuilder)> = D::DICTIONARY_COLUMNS
        .iter()
        .map(|column| (*column, DictionaryBuilder::new()))
        .collect();

    for row in tables.iter().flat_map(RawTable::rows) {
        let Some(decoded) = D::decode(&row) else {
            continue;
        };
        for (column, builder) in &mut builders {
            builder.observe(decoded.categorical(*column));
        }
    }

    let mut set = DictionarySet::new();
    for (column, builder) in builders {
        set.insert(column, builder.build());
    }
    set
}
