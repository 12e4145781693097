//! # datapress - compact, redactable artifacts from raw tabular exports
//!
//! datapress turns raw CSV exports (abuse reports, download logs) into small
//! compressed artifacts that can be aggregated later without the original
//! files. Four mechanisms do the work:
//!
//! - a canonicalizing JSON + Zstandard codec
//! - versioned, authenticated tokens that replace PII in place
//! - dictionary encoding of repeated categorical values
//! - deterministic summaries and top-N leaderboards
//!
//! ## Quick Start
//!
//! ```no_run
//! use datapress::datasets::AbuseReport;
//! use datapress::pipeline;
//! use datapress::secret::TokenCipher;
//! use std::path::{Path, PathBuf};
//!
//! # fn example() -> datapress::error::Result<()> {
//! let cipher = TokenCipher::from_env()?;
//! let packed = pipeline::pack::<AbuseReport>(
//!     &[PathBuf::from("abuse.csv")],
//!     Path::new("out"),
//!     Some(&cipher),
//!     true,
//! )?;
//!
//! let report = pipeline::report::<AbuseReport>(&packed.artifact, None, Some(&cipher), 10)?;
//! for entry in &report.top_addresses {
//!     println!("{}: {} blocks from {} reporters", entry.key, entry.measure_sum, entry.reporters);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`codec`]: canonical JSON and Zstandard compression
//! - [`secret`]: key derivation and the token format
//! - [`pii`]: email and phone-number detection
//! - [`dictionary`]: dictionary encoding and its on-disk form
//! - [`aggregate`]: summaries, breakdowns and leaderboards
//!
//! ## Around the core
//!
//! - [`ingest`] and [`normalize`]: CSV tables to normalized records
//! - [`datasets`]: per-dataset decoding and reports
//! - [`store`] and [`integrity`]: artifact files and their receipts
//! - [`pipeline`]: pack, load and report in one call
//! - [`config`], [`logging`], [`error`]

#![warn(clippy::all, rust_2018_idioms)]

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod datasets;
pub mod dictionary;
pub mod error;
pub mod ingest;
pub mod integrity;
pub mod logging;
pub mod normalize;
pub mod pii;
pub mod pipeline;
pub mod secret;
pub mod store;
