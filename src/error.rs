//! Centralized error handling for datapress.
//!
//! Every failure the core can raise is a variant of [`DatapressError`]. The
//! token and codec variants are kept distinct so callers can tell "cannot be
//! decrypted" apart from "tampered" or "written by a newer format":
//!
//! ```
//! use datapress::error::DatapressError;
//!
//! fn describe(err: &DatapressError) -> &'static str {
//!     match err {
//!         DatapressError::MissingSecret => "no key material configured",
//!         DatapressError::UnsupportedTokenVersion { .. } => "token from a newer writer",
//!         DatapressError::AuthenticationFailed => "tampered token or wrong key",
//!         DatapressError::MalformedToken(_) => "not a token",
//!         _ => "other failure",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to results whose error converts into
//! [`DatapressError`]. Domain variants pass through untouched so that a
//! wrapped `AuthenticationFailed` is still matchable after `?`:
//!
//! ```no_run
//! use datapress::error::ResultExt as _;
//! use std::fs;
//!
//! fn load_artifact() -> datapress::error::Result<Vec<u8>> {
//!     let bytes = fs::read("records.json.zst").context("Failed to read artifact")?;
//!     Ok(bytes)
//! }
//! ```

use std::fmt;

/// Main error type for datapress operations.
#[derive(Debug)]
pub enum DatapressError {
    /// No secret material was available to build a key
    MissingSecret,

    /// Token is not valid base64url or is too short to hold a header and tag
    MalformedToken(String),

    /// Token carries a version byte this build does not understand
    UnsupportedTokenVersion { found: u8, supported: u8 },

    /// Tag verification failed (tampered token or wrong key)
    AuthenticationFailed,

    /// Bytes are not a valid compressed stream
    CorruptArtifact(String),

    /// Decompressed text is not a valid value model
    MalformedValueModel(String),

    /// Raw export lacks columns a dataset needs
    MissingColumns { dataset: String, columns: Vec<String> },

    /// Dictionaries on disk were written by a different run or dataset
    DictionaryMismatch(String),

    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Tabular ingestion errors (Polars, CSV parsing)
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// Generic error with context
    Other(String),
}

impl DatapressError {
    /// True for the variants produced by the token subsystem.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSecret
                | Self::MalformedToken(_)
                | Self::UnsupportedTokenVersion { .. }
                | Self::AuthenticationFailed
        )
    }

    fn is_domain(&self) -> bool {
        self.is_token_error()
            || matches!(
                self,
                Self::CorruptArtifact(_)
                    | Self::MalformedValueModel(_)
                    | Self::MissingColumns { .. }
                    | Self::DictionaryMismatch(_)
            )
    }
}

impl fmt::Display for DatapressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSecret => write!(f, "No secret configured for token encryption"),
            Self::MalformedToken(msg) => write!(f, "Malformed token: {msg}"),
            Self::UnsupportedTokenVersion { found, supported } => {
                write!(f, "Unsupported token version {found} (supported: {supported})")
            }
            Self::AuthenticationFailed => {
                write!(f, "Token authentication failed (tampered data or wrong key)")
            }
            Self::CorruptArtifact(msg) => write!(f, "Corrupt artifact: {msg}"),
            Self::MalformedValueModel(msg) => write!(f, "Malformed value model: {msg}"),
            Self::MissingColumns { dataset, columns } => write!(
                f,
                "Dataset '{dataset}' is missing required columns: {}",
                columns.join(", ")
            ),
            Self::DictionaryMismatch(msg) => write!(f, "Dictionary mismatch: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DatapressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DatapressError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for DatapressError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(other) => Self::Other(format!("{other:#}")),
        }
    }
}

impl From<serde_json::Error> for DatapressError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for DatapressError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<DatapressError> for String {
    fn from(err: DatapressError) -> Self {
        err.to_string()
    }
}

/// Result type alias for datapress operations.
pub type Result<T> = std::result::Result<T, DatapressError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DatapressError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

fn wrap(err: DatapressError, msg: String) -> DatapressError {
    if err.is_domain() {
        err
    } else {
        DatapressError::Other(format!("{msg}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DatapressError::UnsupportedTokenVersion {
            found: 7,
            supported: 1,
        };
        assert_eq!(err.to_string(), "Unsupported token version 7 (supported: 1)");
    }

    #[test]
    fn test_missing_columns_display() {
        let err = DatapressError::MissingColumns {
            dataset: "abuse".to_owned(),
            columns: vec!["address".to_owned(), "reporter".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "Dataset 'abuse' is missing required columns: address, reporter"
        );
    }

    #[test]
    fn test_error_conversion_to_string() {
        let err = DatapressError::MissingSecret;
        let s: String = err.into();
        assert_eq!(s, "No secret configured for token encryption");
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.txt",
        ));

        let result: Result<()> = result.context("Failed to read file");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read file")
        );
    }

    #[test]
    fn test_context_keeps_domain_variant() {
        let result: Result<()> = Err(DatapressError::AuthenticationFailed);
        let result = result.context("Failed to reveal comment");
        assert!(matches!(result, Err(DatapressError::AuthenticationFailed)));
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_variant() {
        let wrapped = anyhow::Error::new(DatapressError::MissingSecret);
        let back: DatapressError = wrapped.into();
        assert!(matches!(back, DatapressError::MissingSecret));
    }
}
