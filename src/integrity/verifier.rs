//! Receipt verification.

use crate::error::{DatapressError, Result, ResultExt as _};
use crate::integrity::hasher::compute_file_hash;
use crate::integrity::receipt::ArtifactReceipt;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub passed: bool,
    pub message: String,
    pub file_path: String,
    pub expected_hash: String,
    /// Absent when the artifact could not be hashed
    pub actual_hash: Option<String>,
    pub receipt: ArtifactReceipt,
}

impl VerificationResult {
    fn pass(file_path: String, hash: String, receipt: ArtifactReceipt) -> Self {
        Self {
            passed: true,
            message: "Artifact integrity verified successfully".to_owned(),
            file_path,
            expected_hash: hash.clone(),
            actual_hash: Some(hash),
            receipt,
        }
    }

    fn fail(
        file_path: String,
        actual: Option<String>,
        reason: String,
        receipt: ArtifactReceipt,
    ) -> Self {
        Self {
            passed: false,
            message: reason,
            file_path,
            expected_hash: receipt.integrity.hash.clone(),
            actual_hash: actual,
            receipt,
        }
    }

    /// Multi-line summary for terminal output.
    pub fn format_cli(&self) -> String {
        if self.passed {
            let artifact = &self.receipt.artifact;
            format!(
                "✓ PASS: Artifact integrity verified\n  \
                File: {}\n  \
                Hash: {} ({})\n  \
                Dataset: {}, Records: {}\n  \
                Size: {} bytes ({} uncompressed)\n  \
                Created: {}",
                self.file_path,
                self.expected_hash.get(..16).unwrap_or(&self.expected_hash),
                self.receipt.integrity.hash_algorithm,
                artifact.dataset,
                artifact.record_count,
                artifact.compressed_bytes,
                artifact.uncompressed_bytes,
                self.receipt.created_utc.format("%Y-%m-%d %H:%M:%S UTC")
            )
        } else {
            let mut output = format!(
                "✗ FAIL: {}\n  \
                File: {}\n  \
                Expected: {}\n  ",
                self.message, self.file_path, self.expected_hash
            );
            if let Some(actual) = &self.actual_hash {
                output.push_str(&format!("Actual:   {actual}\n  "));
            }
            output.push_str("Artifact may have been modified or corrupted");
            output
        }
    }
}

/// Check the artifact a receipt describes.
///
/// The artifact is looked up by the receipt's `filename` in the receipt's
/// own directory, then its size and SHA-256 are compared with the recorded
/// values.
///
/// # Arguments
///
/// * `receipt_path` - Path to the `.receipt.json` file
///
/// # Returns
///
/// A [`VerificationResult`]. A missing artifact, a size mismatch or a hash
/// mismatch is a failed verification (`passed == false` with the reason in
/// `message`), not an error.
///
/// # Errors
///
/// Returns error if:
/// - The receipt file cannot be read
/// - The receipt is not valid receipt JSON
/// - The receipt path has no parent directory
///
/// # Example
///
/// ```no_run
/// use datapress::integrity::verify_receipt;
/// use std::path::Path;
///
/// # fn example() -> datapress::error::Result<()> {
/// let result = verify_receipt(Path::new("out/abuse.json.zst.receipt.json"))?;
/// println!("{}", result.format_cli());
/// # Ok(())
/// # }
/// ```
pub fn verify_receipt(receipt_path: &Path) -> Result<VerificationResult> {
    let receipt_json = fs::read_to_string(receipt_path)
        .with_context(|| format!("Failed to read receipt file: {}", receipt_path.display()))?;
    let receipt: ArtifactReceipt = serde_json::from_str(&receipt_json)
        .context("Failed to parse receipt JSON (file may be corrupted)")?;

    let receipt_dir = receipt_path
        .parent()
        .ok_or_else(|| DatapressError::InvalidPath("Receipt has no parent directory".to_owned()))?;
    let artifact_path = receipt_dir.join(&receipt.artifact.filename);
    let display = artifact_path.display().to_string();

    let Ok(metadata) = fs::metadata(&artifact_path) else {
        let reason = format!(
            "Artifact not found: {}. File may have been moved or deleted.",
            receipt.artifact.filename
        );
        return Ok(VerificationResult::fail(display, None, reason, receipt));
    };

    let actual_hash = match compute_file_hash(&artifact_path) {
        Ok(hash) => hash,
        Err(e) => {
            let reason = format!("Failed to compute hash: {e}");
            return Ok(VerificationResult::fail(display, None, reason, receipt));
        }
    };

    let result = if metadata.len() != receipt.artifact.compressed_bytes {
        let reason = format!(
            "Size mismatch: expected {} bytes, found {}",
            receipt.artifact.compressed_bytes,
            metadata.len()
        );
        VerificationResult::fail(display, Some(actual_hash), reason, receipt)
    } else if actual_hash == receipt.integrity.hash {
        VerificationResult::pass(display, actual_hash, receipt)
    } else {
        VerificationResult::fail(
            display,
            Some(actual_hash),
            "Hash mismatch detected".to_owned(),
            receipt,
        )
    };

    if result.passed {
        tracing::info!(file = %result.file_path, "artifact verified");
    } else {
        tracing::warn!(file = %result.file_path, reason = %result.message, "artifact verification failed");
    }
    Ok(result)
}
