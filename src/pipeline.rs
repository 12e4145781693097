//! End-to-end packing of raw exports and reading packed artifacts back.
//!
//! ```text
//! CSV exports ──load──> RawTable ──normalize──> records + dictionaries
//!                                   │
//!                                redact (PII fields → tokens)
//!                                   │
//!        <out>/<dataset>.json.zst + receipt      <out>/dictionaries/*.json
//! ```
//!
//! Reading reverses it: decompress, reveal tokens when a cipher is available,
//! attach the dictionaries and aggregate.
//!
//! # Example
//!
//! ```no_run
//! use datapress::datasets::AbuseReport;
//! use datapress::pipeline;
//! use datapress::secret::TokenCipher;
//! use std::path::{Path, PathBuf};
//!
//! let cipher = TokenCipher::from_env()?;
//! let inputs = [PathBuf::from("reports-2024-01.csv"), PathBuf::from("reports-2024-02.csv")];
//!
//! let packed = pipeline::pack::<AbuseReport>(&inputs, Path::new("out"), Some(&cipher), true)?;
//! println!("{}", packed.summary());
//!
//! let report = pipeline::report::<AbuseReport>(&packed.artifact, None, Some(&cipher), 10)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod pack;
pub mod redaction;

pub use pack::{PackReport, load, pack, pack_tables, report};
pub use redaction::{Redact, redact_text, reveal_text};
