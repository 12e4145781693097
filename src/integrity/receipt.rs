//! Receipt structures and persistence.

use crate::error::{Result, ResultExt as _};
use crate::integrity::hasher::{HASH_ALGORITHM, hash_bytes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current receipt schema version.
pub const RECEIPT_VERSION: u32 = 1;

/// Codec identifier recorded for every artifact.
pub const ARTIFACT_CODEC: &str = "zstd";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReceipt {
    pub receipt_version: u32,
    pub created_utc: DateTime<Utc>,
    pub producer: ProducerInfo,
    pub artifact: ArtifactInfo,
    pub integrity: IntegrityInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerInfo {
    pub app_name: String,
    pub app_version: String,
    pub platform: String,
}

impl ProducerInfo {
    fn current() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_owned(),
            app_version: env!("CARGO_PKG_VERSION").to_owned(),
            platform: std::env::consts::OS.to_owned(),
        }
    }
}

/// What the artifact holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    /// File name only; the artifact is expected next to its receipt
    pub filename: String,
    pub dataset: String,
    pub codec: String,
    /// Whether object keys were sorted before compression
    pub canonical: bool,
    pub compressed_bytes: u64,
    pub uncompressed_bytes: u64,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityInfo {
    pub hash_algorithm: String,
    /// Lowercase hex digest of the compressed bytes
    pub hash: String,
}

/// Build a receipt for artifact bytes about to be (or just) written.
///
/// # Arguments
///
/// * `artifact_path` - Where the artifact lives; only its file name is kept
/// * `compressed` - The exact bytes written to disk, hashed here
/// * `uncompressed_bytes` - Length of the JSON text before compression
/// * `dataset` - Dataset name recorded for readers
/// * `canonical` - Whether object keys were sorted before compression
/// * `record_count` - Number of records in the artifact
///
/// # Returns
///
/// An [`ArtifactReceipt`] stamped with the current time and this build's
/// producer info. Nothing is written to disk.
pub fn create_receipt(
    artifact_path: &Path,
    compressed: &[u8],
    uncompressed_bytes: usize,
    dataset: &str,
    canonical: bool,
    record_count: usize,
) -> ArtifactReceipt {
    let filename = artifact_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_owned();

    ArtifactReceipt {
        receipt_version: RECEIPT_VERSION,
        created_utc: Utc::now(),
        producer: ProducerInfo::current(),
        artifact: ArtifactInfo {
            filename,
            dataset: dataset.to_owned(),
            codec: ARTIFACT_CODEC.to_owned(),
            canonical,
            compressed_bytes: compressed.len() as u64,
            uncompressed_bytes: uncompressed_bytes as u64,
            record_count,
        },
        integrity: IntegrityInfo {
            hash_algorithm: HASH_ALGORITHM.to_owned(),
            hash: hash_bytes(compressed),
        },
    }
}

/// `abuse.json.zst` becomes `abuse.json.zst.receipt.json`.
pub fn receipt_path_for(artifact_path: &Path) -> PathBuf {
    let mut name = artifact_path.as_os_str().to_owned();
    name.push(".receipt.json");
    PathBuf::from(name)
}

/// Write the receipt next to the artifact.
///
/// The receipt lands at [`receipt_path_for`] of `artifact_path`, overwriting
/// any earlier receipt.
///
/// # Returns
///
/// Path of the written receipt.
///
/// # Errors
///
/// Returns error if the receipt cannot be serialized or the file cannot be
/// written.
pub fn save_receipt(receipt: &ArtifactReceipt, artifact_path: &Path) -> Result<PathBuf> {
    let receipt_path = receipt_path_for(artifact_path);
    let json = serde_json::to_string_pretty(receipt).context("Failed to serialize receipt")?;
    fs::write(&receipt_path, json)
        .with_context(|| format!("Failed to write receipt to {}", receipt_path.display()))?;
    Ok(receipt_path)
}
