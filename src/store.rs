//! Artifact files on disk.
//!
//! An artifact is the byte-exact output of the codec, `<name>.json.zst`,
//! with no header of its own. Its integrity receipt sits next to it.

use crate::codec;
use crate::error::{DatapressError, Result, ResultExt as _};
use crate::integrity::{self, ArtifactReceipt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub use crate::dictionary::storage::{
    DICTIONARIES_DIR, dictionary_dir, read_dictionary, read_manifest, write_dictionaries,
};

/// Extension of every compressed artifact.
pub const ARTIFACT_EXTENSION: &str = "json.zst";

/// Paths and receipt produced by [`write_artifact`].
#[derive(Debug, Clone)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub receipt_path: PathBuf,
    pub receipt: ArtifactReceipt,
}

/// Path of the artifact called `name` inside `dir`.
pub fn artifact_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
}

/// Compress `value` into `<dir>/<name>.json.zst` and write its receipt.
///
/// # Arguments
///
/// * `dir` - Output directory, created if missing
/// * `name` - Artifact stem; the file is `<name>.json.zst`
/// * `value` - Anything serde can render as a JSON value
/// * `canonical` - Sort object keys before compression
/// * `dataset` - Recorded in the receipt only
/// * `record_count` - Recorded in the receipt only
///
/// # Returns
///
/// The artifact path, the receipt path and the receipt itself.
///
/// # Errors
///
/// - [`DatapressError::MalformedValueModel`] if `value` does not serialize
///   to JSON
/// - An I/O-derived error if the directory, artifact or receipt cannot be
///   written
pub fn write_artifact<T: Serialize>(
    dir: &Path,
    name: &str,
    value: &T,
    canonical: bool,
    dataset: &str,
    record_count: usize,
) -> Result<WrittenArtifact> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let value = serde_json::to_value(value)
        .map_err(|e| DatapressError::MalformedValueModel(e.to_string()))?;
    let text = codec::to_json_text(&value, canonical)?;
    let compressed = codec::compress_text(&text)?;

    let path = artifact_path(dir, name);
    fs::write(&path, &compressed)
        .with_context(|| format!("Failed to write artifact {}", path.display()))?;

    let receipt = integrity::create_receipt(
        &path,
        &compressed,
        text.len(),
        dataset,
        canonical,
        record_count,
    );
    let receipt_path = integrity::save_receipt(&receipt, &path)?;

    tracing::info!(
        artifact = %path.display(),
        compressed = compressed.len(),
        uncompressed = text.len(),
        records = record_count,
        canonical,
        "wrote artifact"
    );

    Ok(WrittenArtifact {
        path,
        receipt_path,
        receipt,
    })
}

/// Read and decode an artifact written by [`write_artifact`].
///
/// # Errors
///
/// - [`DatapressError::InvalidPath`] if the file does not exist
/// - [`DatapressError::CorruptArtifact`] if the bytes are not a valid
///   compressed stream
/// - [`DatapressError::MalformedValueModel`] if the text does not decode
///   into `T`
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(DatapressError::InvalidPath(format!(
            "Artifact not found: {}",
            path.display()
        )));
    }
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    codec::decompress_deserializable(&bytes)
}
