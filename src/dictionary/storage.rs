//! Persistence for dictionaries produced by a normalization run.
//!
//! Each column is written as two plain JSON objects so that consumers can
//! read either direction without knowing anything about this crate. Every
//! dataset gets its own directory, so packing several datasets into one
//! output directory keeps their ids apart:
//!
//! ```text
//! <dir>/dictionaries/<dataset>/manifest.json
//! <dir>/dictionaries/<dataset>/<column>.forward.json   {"a@x.com": 1, ...}
//! <dir>/dictionaries/<dataset>/<column>.inverse.json   {"1": "a@x.com", ...}
//! ```

use super::{Dictionary, DictionarySet};
use crate::error::DatapressError;
use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory name for dictionary files under an output directory.
pub const DICTIONARIES_DIR: &str = "dictionaries";

const MANIFEST_FILE: &str = "manifest.json";

/// Summary of the dictionaries written by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryManifest {
    pub run_id: Uuid,
    pub dataset: String,
    pub created_utc: DateTime<Utc>,
    pub columns: Vec<ColumnEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub column: String,
    pub entries: usize,
}

/// Directory holding one dataset's dictionaries under `base_path`.
pub fn dictionary_dir(base_path: &Path, dataset: &str) -> PathBuf {
    base_path.join(DICTIONARIES_DIR).join(dataset)
}

fn forward_path(dict_dir: &Path, column: &str) -> PathBuf {
    dict_dir.join(format!("{column}.forward.json"))
}

fn inverse_path(dict_dir: &Path, column: &str) -> PathBuf {
    dict_dir.join(format!("{column}.inverse.json"))
}

/// Write every dictionary in `set` plus a manifest.
///
/// Files from an earlier run of the same dataset are overwritten.
///
/// # Arguments
///
/// * `set` - Dictionaries built by the run
/// * `base_path` - Output directory; files land in `dictionaries/<dataset>/`
/// * `run_id` - Run that built the dictionaries, recorded in the manifest
/// * `dataset` - Dataset name
///
/// # Returns
///
/// Path to the dataset's dictionary directory.
///
/// # Errors
///
/// Fails if the directory cannot be created or a file cannot be written.
pub fn write_dictionaries(
    set: &DictionarySet,
    base_path: &Path,
    run_id: Uuid,
    dataset: &str,
) -> Result<PathBuf> {
    let dict_dir = dictionary_dir(base_path, dataset);
    fs::create_dir_all(&dict_dir).context("Failed to create dictionaries directory")?;

    let mut columns = Vec::with_capacity(set.len());
    for (column, dictionary) in set.iter() {
        write_json(&forward_path(&dict_dir, column), dictionary.forward())?;
        write_json(&inverse_path(&dict_dir, column), dictionary.inverse())?;
        columns.push(ColumnEntry {
            column: column.to_owned(),
            entries: dictionary.len(),
        });
    }

    let manifest = DictionaryManifest {
        run_id,
        dataset: dataset.to_owned(),
        created_utc: Utc::now(),
        columns,
    };
    write_json(&dict_dir.join(MANIFEST_FILE), &manifest)?;

    tracing::info!(
        dir = %dict_dir.display(),
        columns = manifest.columns.len(),
        %run_id,
        "wrote dictionaries"
    );

    Ok(dict_dir)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load one column's dictionary and check that both files agree.
///
/// # Arguments
///
/// * `base_path` - Directory containing `dictionaries/`
/// * `dataset` - Dataset the dictionary was written for
/// * `column` - Column name the dictionary was written under
///
/// # Errors
///
/// Fails if either file is missing or unparsable, if the forward map does
/// not use dense ids in byte order, or if the inverse map disagrees with it.
pub fn read_dictionary(base_path: &Path, dataset: &str, column: &str) -> Result<Dictionary> {
    let dict_dir = dictionary_dir(base_path, dataset);

    let forward: BTreeMap<String, u32> = read_json(&forward_path(&dict_dir, column))?;
    let inverse: BTreeMap<u32, String> = read_json(&inverse_path(&dict_dir, column))?;

    let Some(dictionary) = Dictionary::from_forward(forward) else {
        bail!("Dictionary for '{column}' does not use dense sorted ids");
    };
    if dictionary.inverse() != &inverse {
        bail!("Forward and inverse dictionaries for '{column}' disagree");
    }

    Ok(dictionary)
}

/// Load a dataset's manifest and every dictionary it lists.
///
/// # Arguments
///
/// * `base_path` - Directory containing `dictionaries/`
/// * `dataset` - Dataset whose dictionaries to load
///
/// # Returns
///
/// The manifest and the dictionaries keyed by column. The caller decides
/// whether the manifest's run matches the records it is pairing them with.
///
/// # Errors
///
/// Fails if the manifest or any listed dictionary cannot be read (see
/// [`read_dictionary`]), or if the manifest names another dataset.
pub fn read_manifest(base_path: &Path, dataset: &str) -> Result<(DictionaryManifest, DictionarySet)> {
    let manifest: DictionaryManifest =
        read_json(&dictionary_dir(base_path, dataset).join(MANIFEST_FILE))?;
    if manifest.dataset != dataset {
        bail!(DatapressError::DictionaryMismatch(format!(
            "manifest under '{dataset}' was written for '{}'",
            manifest.dataset
        )));
    }

    let mut set = DictionarySet::new();
    for entry in &manifest.columns {
        set.insert(
            entry.column.clone(),
            read_dictionary(base_path, dataset, &entry.column)?,
        );
    }

    Ok((manifest, set))
}
