//! Raw CSV exports as string tables.
//!
//! Every column is read as text. Interpreting cells (timestamps, counts,
//! categorical values) is left to the dataset decoders, which decide whether a
//! malformed cell drops its row.

use crate::error::{DatapressError, Result};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// A loaded export: normalized header names mapped to their cell values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    source: String,
    headers: Vec<String>,
    columns: HashMap<String, Vec<String>>,
    height: usize,
}

/// Normalize a header: trimmed, lowercase, runs of non-alphanumerics become a
/// single underscore. `"Reported At"` becomes `reported_at`.
pub fn normalize_header(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_underscore = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_underscore && !result.is_empty() {
                result.push('_');
            }
            pending_underscore = false;
            result.push(c);
        } else {
            pending_underscore = true;
        }
    }
    result
}

impl RawTable {
    /// Build a table from in-memory columns. Shorter columns are padded with
    /// empty cells.
    pub fn from_columns<I, K, V, S>(source: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self {
            source: source.into(),
            ..Self::default()
        };
        for (name, values) in columns {
            table.push_column(name.as_ref(), values.into_iter().map(Into::into).collect());
        }
        table.pad();
        table
    }

    fn push_column(&mut self, raw_name: &str, values: Vec<String>) {
        let base = normalize_header(raw_name);
        let base = if base.is_empty() { "col".to_owned() } else { base };
        let mut name = base.clone();
        let mut suffix = 0;
        while self.columns.contains_key(&name) {
            suffix += 1;
            name = format!("{base}_{suffix}");
        }
        self.height = self.height.max(values.len());
        self.headers.push(name.clone());
        self.columns.insert(name, values);
    }

    fn pad(&mut self) {
        for values in self.columns.values_mut() {
            values.resize(self.height, String::new());
        }
    }

    /// Convert a polars frame, casting every column to text. Nulls become
    /// empty strings.
    pub fn from_dataframe(source: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let mut table = Self {
            source: source.into(),
            ..Self::default()
        };
        for column in df.get_columns() {
            let series = column.as_materialized_series().cast(&DataType::String)?;
            let values: Vec<String> = series
                .str()?
                .into_iter()
                .map(|cell| cell.unwrap_or_default().to_owned())
                .collect();
            table.push_column(column.name().as_str(), values);
        }
        table.pad();
        Ok(table)
    }

    /// Where the table came from, for log and error messages.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Fail with every required column that is absent, not just the first.
    pub fn require_columns(&self, dataset: &str, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| (*column).to_owned())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatapressError::MissingColumns {
                dataset: dataset.to_owned(),
                columns: missing,
            })
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.height).map(move |index| RowView { table: self, index })
    }
}

/// Borrowed view of a single row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a RawTable,
    index: usize,
}

impl<'a> RowView<'a> {
    /// Trimmed cell text; empty when the column does not exist.
    pub fn get(&self, column: &str) -> &'a str {
        self.table
            .columns
            .get(column)
            .and_then(|values| values.get(self.index))
            .map_or("", |cell| cell.trim())
    }

    /// Zero-based position within the source table.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Read a CSV export with a header row. No type inference is performed.
pub fn load_table(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(DatapressError::InvalidPath(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    let table = RawTable::from_dataframe(path.display().to_string(), &df)?;
    tracing::debug!(
        source = table.source(),
        rows = table.height(),
        columns = table.headers().len(),
        "loaded raw table"
    );
    Ok(table)
}

/// Load several exports that belong to the same batch.
pub fn load_tables<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RawTable>> {
    paths.iter().map(|path| load_table(path.as_ref())).collect()
}
