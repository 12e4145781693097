//! Dictionary encoding for categorical columns.
//!
//! A dictionary maps each distinct trimmed, non-empty value to a dense id
//! starting at 1. Ids follow the byte order of the values, so the mapping is
//! a pure function of the distinct-value set: input order and batch
//! boundaries never change it.
//!
//! ## Usage
//!
//! ```
//! use datapress::dictionary::DictionaryBuilder;
//!
//! let mut builder = DictionaryBuilder::new();
//! builder.extend(["b@x.com", "a@x.com", " a@x.com "]);
//! let dict = builder.build();
//!
//! assert_eq!(dict.id("a@x.com"), Some(1));
//! assert_eq!(dict.id("b@x.com"), Some(2));
//! assert_eq!(dict.value(2), Some("b@x.com"));
//! ```
//!
//! Dictionaries are immutable once built. A new normalization run builds new
//! dictionaries; ids are only stable across runs that see the same values.

pub mod storage;

pub use storage::{
    DictionaryManifest, dictionary_dir, read_dictionary, read_manifest, write_dictionaries,
};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Forward and inverse maps for one categorical column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    forward: BTreeMap<String, u32>,
    inverse: BTreeMap<u32, String>,
}

impl Dictionary {
    /// Build a dictionary from raw values in one call.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = DictionaryBuilder::new();
        builder.extend(values);
        builder.build()
    }

    /// Rebuild a dictionary from a stored forward map.
    ///
    /// Returns `None` unless the ids are exactly `1..=n` in value order.
    pub fn from_forward(forward: BTreeMap<String, u32>) -> Option<Self> {
        let inverse: BTreeMap<u32, String> = forward
            .iter()
            .map(|(value, id)| (*id, value.clone()))
            .collect();

        let dense = forward
            .values()
            .zip(1u32..)
            .all(|(id, expected)| *id == expected);

        (dense && inverse.len() == forward.len()).then_some(Self { forward, inverse })
    }

    /// Id of a raw value (trimmed before lookup).
    pub fn id(&self, raw: &str) -> Option<u32> {
        self.forward.get(raw.trim()).copied()
    }

    /// Value for an id.
    pub fn value(&self, id: u32) -> Option<&str> {
        self.inverse.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Value → id, in value order.
    pub fn forward(&self) -> &BTreeMap<String, u32> {
        &self.forward
    }

    /// Id → value, in id order.
    pub fn inverse(&self) -> &BTreeMap<u32, String> {
        &self.inverse
    }
}

/// Accumulates distinct values across any number of batches.
#[derive(Debug, Clone, Default)]
pub struct DictionaryBuilder {
    seen: BTreeSet<String>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw value. Blank values are ignored.
    pub fn observe(&mut self, raw: &str) {
        let value = raw.trim();
        if !value.is_empty() && !self.seen.contains(value) {
            self.seen.insert(value.to_owned());
        }
    }

    pub fn extend<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.observe(value.as_ref());
        }
    }

    /// Number of distinct values seen so far.
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }

    /// Assign ids in sorted order.
    pub fn build(self) -> Dictionary {
        let mut forward = BTreeMap::new();
        let mut inverse = BTreeMap::new();
        for (value, id) in self.seen.into_iter().zip(1u32..) {
            forward.insert(value.clone(), id);
            inverse.insert(id, value);
        }
        Dictionary { forward, inverse }
    }
}

/// Dictionaries for every encoded column of a dataset, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DictionarySet(BTreeMap<String, Dictionary>);

impl DictionarySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, dictionary: Dictionary) {
        self.0.insert(column.into(), dictionary);
    }

    pub fn get(&self, column: &str) -> Option<&Dictionary> {
        self.0.get(column)
    }

    /// Id of `raw` in `column`'s dictionary.
    pub fn id(&self, column: &str, raw: &str) -> Option<u32> {
        self.get(column)?.id(raw)
    }

    /// Value of `id` in `column`'s dictionary.
    pub fn value(&self, column: &str, id: u32) -> Option<&str> {
        self.get(column)?.value(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dictionary)> {
        self.0.iter().map(|(column, dict)| (column.as_str(), dict))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
