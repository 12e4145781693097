//! Integrity receipts for packed artifacts.
//!
//! Every compressed artifact gets a sidecar `<artifact>.receipt.json`
//! recording who produced it, what it holds and the SHA-256 of the exact
//! bytes on disk. Verification recomputes the hash and reports pass or fail
//! with enough detail to print.
//!
//! ## Usage
//!
//! ```no_run
//! use datapress::integrity;
//! use std::path::Path;
//!
//! # fn example() -> datapress::error::Result<()> {
//! let result = integrity::verify_receipt(Path::new("out/abuse.json.zst.receipt.json"))?;
//! println!("{}", result.format_cli());
//! # Ok(())
//! # }
//! ```
//!
//! ## Receipt Format
//!
//! ```json
//! {
//!   "receipt_version": 1,
//!   "created_utc": "2026-01-24T12:34:56.789Z",
//!   "producer": { "app_name": "datapress", "app_version": "0.1.0", "platform": "linux" },
//!   "artifact": {
//!     "filename": "abuse.json.zst",
//!     "dataset": "abuse",
//!     "codec": "zstd",
//!     "canonical": true,
//!     "compressed_bytes": 5123,
//!     "uncompressed_bytes": 88211,
//!     "record_count": 1200
//!   },
//!   "integrity": { "hash_algorithm": "SHA-256", "hash": "a3b2c1d4..." }
//! }
//! ```
//!
//! The hash covers compressed bytes, so re-compressing identical content at a
//! different level fails verification.
//!
//! - [`receipt`]: receipt structures and persistence
//! - [`hasher`]: SHA-256 over files and buffers
//! - [`verifier`]: verification and CLI formatting

pub mod hasher;
pub mod receipt;
pub mod verifier;

pub use hasher::{compute_file_hash, hash_bytes};
pub use receipt::{
    ArtifactInfo, ArtifactReceipt, IntegrityInfo, ProducerInfo, create_receipt, receipt_path_for,
    save_receipt,
};
pub use verifier::{VerificationResult, verify_receipt};
