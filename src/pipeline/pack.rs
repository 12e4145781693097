//! Pack, load and report.

use super::redaction::{redact_all, reveal_all};
use crate::datasets::Dataset;
use crate::dictionary::{read_manifest, write_dictionaries};
use crate::error::{DatapressError, Result};
use crate::ingest::{RawTable, load_tables};
use crate::normalize::{Normalized, normalize};
use crate::secret::TokenCipher;
use crate::store::{self, WrittenArtifact};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Outcome of one [`pack`] run.
#[derive(Debug, Clone)]
pub struct PackReport {
    pub run_id: Uuid,
    pub dataset: String,
    pub records: usize,
    pub dropped: usize,
    /// Records with at least one field replaced by a token
    pub redacted: usize,
    pub artifact: PathBuf,
    pub receipt: PathBuf,
    pub dictionaries: PathBuf,
    pub compressed_bytes: u64,
    pub uncompressed_bytes: u64,
    pub duration: Duration,
}

impl PackReport {
    pub fn summary(&self) -> String {
        format!(
            "Packed {} {} records ({} dropped, {} redacted) into {} bytes ({} uncompressed) in {:.2}s",
            self.records,
            self.dataset,
            self.dropped,
            self.redacted,
            self.compressed_bytes,
            self.uncompressed_bytes,
            self.duration.as_secs_f64()
        )
    }
}

/// Load CSV exports and pack them as one batch.
pub fn pack<D: Dataset>(
    inputs: &[PathBuf],
    out_dir: &Path,
    cipher: Option<&TokenCipher>,
    canonical: bool,
) -> Result<PackReport> {
    if inputs.is_empty() {
        return Err(DatapressError::InvalidPath(
            "No input files given".to_owned(),
        ));
    }
    let tables = load_tables(inputs)?;
    pack_tables::<D>(&tables, out_dir, cipher, canonical)
}

/// Normalize, redact and write already-loaded tables.
///
/// `cipher` is only required when some record actually contains PII; a batch
/// without PII packs fine without one.
pub fn pack_tables<D: Dataset>(
    tables: &[RawTable],
    out_dir: &Path,
    cipher: Option<&TokenCipher>,
    canonical: bool,
) -> Result<PackReport> {
    let start = Instant::now();

    let mut normalized = normalize::<D>(tables)?;
    let redacted = redact_all(&mut normalized.records, cipher)?;

    let dictionaries =
        write_dictionaries(&normalized.dictionaries, out_dir, normalized.run_id, D::NAME)?;
    let WrittenArtifact {
        path,
        receipt_path,
        receipt,
    } = store::write_artifact(
        out_dir,
        D::NAME,
        &normalized,
        canonical,
        D::NAME,
        normalized.len(),
    )?;

    let report = PackReport {
        run_id: normalized.run_id,
        dataset: D::NAME.to_owned(),
        records: normalized.len(),
        dropped: normalized.dropped,
        redacted,
        artifact: path,
        receipt: receipt_path,
        dictionaries,
        compressed_bytes: receipt.artifact.compressed_bytes,
        uncompressed_bytes: receipt.artifact.uncompressed_bytes,
        duration: start.elapsed(),
    };
    tracing::info!(
        dataset = D::NAME,
        run_id = %report.run_id,
        records = report.records,
        dropped = report.dropped,
        redacted = report.redacted,
        "pack complete"
    );
    Ok(report)
}

/// Read a packed artifact and its dictionaries.
///
/// Dictionaries are read from `dictionaries_dir` or, when `None`, from the
/// directory holding the artifact. With a cipher, redacted fields are
/// decrypted.
///
/// # Errors
///
/// - [`DatapressError::MalformedValueModel`] if the artifact holds another dataset
/// - [`DatapressError::DictionaryMismatch`] if the dictionaries on disk were
///   written by a different run or for another dataset
/// - [`DatapressError::AuthenticationFailed`] on a wrong key
pub fn load<D: Dataset>(
    artifact: &Path,
    dictionaries_dir: Option<&Path>,
    cipher: Option<&TokenCipher>,
) -> Result<Normalized<D::Record>> {
    let mut normalized: Normalized<D::Record> = store::read_artifact(artifact)?;
    if normalized.dataset != D::NAME {
        return Err(DatapressError::MalformedValueModel(format!(
            "artifact holds '{}' records, expected '{}'",
            normalized.dataset,
            D::NAME
        )));
    }

    let base = match dictionaries_dir {
        Some(dir) => dir.to_path_buf(),
        None => artifact
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let (manifest, dictionaries) = read_manifest(&base, D::NAME)?;
    if manifest.run_id != normalized.run_id {
        return Err(DatapressError::DictionaryMismatch(format!(
            "artifact is from run {}, dictionaries from run {}",
            normalized.run_id, manifest.run_id
        )));
    }
    normalized.dictionaries = dictionaries;

    let revealed = reveal_all(&mut normalized.records, cipher)?;
    tracing::debug!(
        artifact = %artifact.display(),
        records = normalized.len(),
        revealed,
        "loaded artifact"
    );
    Ok(normalized)
}

/// Load an artifact and aggregate it with the dataset's report.
pub fn report<D: Dataset>(
    artifact: &Path,
    dictionaries_dir: Option<&Path>,
    cipher: Option<&TokenCipher>,
    top: usize,
) -> Result<D::Report> {
    let normalized = load::<D>(artifact, dictionaries_dir, cipher)?;
    Ok(D::report(&normalized.records, &normalized.dictionaries, top))
}
