//! Canonical serialization and compression for stored artifacts.
//!
//! Artifacts are JSON text compressed with Zstandard at a high level with a
//! large window. Object keys can optionally be sorted before serialization so
//! that records with the same shape serialize identically, which noticeably
//! helps the compressor on long record arrays.
//!
//! ```
//! use datapress::codec;
//! use serde_json::json;
//!
//! let value = json!({"b": 2, "a": [1, 2, 3]});
//! let bytes = codec::compress_value(&value, true)?;
//! assert_eq!(codec::decompress_value(&bytes)?, value);
//! # Ok::<(), datapress::error::DatapressError>(())
//! ```
//!
//! Canonicalization only touches JSON objects. Values that are not plain
//! objects (timestamps, enums, newtypes) have already been rendered by serde
//! by the time they reach this module; `chrono` timestamps arrive as RFC 3339
//! strings and are kept as-is.

use crate::error::{DatapressError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::io::Write as _;

/// Zstandard level used for every artifact.
pub const COMPRESSION_LEVEL: i32 = 19;

/// Window size exponent (16 MiB), within the decoder's default limit.
pub const WINDOW_LOG: u32 = 24;

/// Compress UTF-8 text.
pub fn compress_text(text: &str) -> Result<Vec<u8>> {
    let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), COMPRESSION_LEVEL)?;
    encoder.include_checksum(true)?;
    encoder.window_log(WINDOW_LOG)?;
    encoder.long_distance_matching(true)?;
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Inverse of [`compress_text`].
///
/// # Errors
///
/// [`DatapressError::CorruptArtifact`] if the bytes are not a valid
/// Zstandard frame or do not decode to UTF-8.
pub fn decompress_text(bytes: &[u8]) -> Result<String> {
    let raw = zstd::stream::decode_all(bytes)
        .map_err(|e| DatapressError::CorruptArtifact(e.to_string()))?;
    String::from_utf8(raw)
        .map_err(|e| DatapressError::CorruptArtifact(format!("decoded bytes are not UTF-8: {e}")))
}

/// Recursively sort object keys. Arrays keep their element order.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key, canonicalize(inner)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// JSON text for a value, with keys sorted when `canonical` is set.
pub fn to_json_text(value: &Value, canonical: bool) -> Result<String> {
    if canonical {
        serde_json::to_string(&canonicalize(value.clone()))
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| DatapressError::MalformedValueModel(e.to_string()))
}

/// Serialize a value to JSON text (optionally canonicalized) and compress it.
pub fn compress_value(value: &Value, canonical: bool) -> Result<Vec<u8>> {
    compress_text(&to_json_text(value, canonical)?)
}

/// Inverse of [`compress_value`]. Keys come back in whatever order they were
/// written.
///
/// # Errors
///
/// [`DatapressError::CorruptArtifact`] when decompression fails,
/// [`DatapressError::MalformedValueModel`] when the text is not JSON.
pub fn decompress_value(bytes: &[u8]) -> Result<Value> {
    let text = decompress_text(bytes)?;
    serde_json::from_str(&text).map_err(|e| DatapressError::MalformedValueModel(e.to_string()))
}

/// Compress any serializable type through the JSON value model.
pub fn compress_serializable<T: Serialize>(value: &T, canonical: bool) -> Result<Vec<u8>> {
    let value =
        serde_json::to_value(value).map_err(|e| DatapressError::MalformedValueModel(e.to_string()))?;
    compress_value(&value, canonical)
}

/// Decompress bytes written by [`compress_serializable`] into `T`.
pub fn decompress_deserializable<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let value = decompress_value(bytes)?;
    serde_json::from_value(value).map_err(|e| DatapressError::MalformedValueModel(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};
    use serde_json::json;

    #[test]
    fn test_text_roundtrip() {
        let text = "session 42 \u{2014} ünïcödé ✓\nline two";
        let bytes = compress_text(text).unwrap();
        assert_eq!(decompress_text(&bytes).unwrap(), text);
    }

    #[test]
    fn test_empty_text_roundtrip() {
        let bytes = compress_text("").unwrap();
        assert_eq!(decompress_text(&bytes).unwrap(), "");
    }

    #[test]
    fn test_repetitive_text_shrinks() {
        let text = r#"{"country":"DE","version":"1.2.0"}"#.repeat(500);
        let bytes = compress_text(&text).unwrap();
        assert!(bytes.len() * 10 < text.len());
    }

    #[test]
    fn test_garbage_is_corrupt_artifact() {
        let result = decompress_text(b"definitely not zstd");
        assert!(matches!(result, Err(DatapressError::CorruptArtifact(_))));
    }

    #[test]
    fn test_truncated_stream_is_corrupt_artifact() {
        let bytes = compress_text(&"abcdef".repeat(100)).unwrap();
        let result = decompress_text(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DatapressError::CorruptArtifact(_))));
    }

    #[test]
    fn test_non_utf8_payload_is_corrupt_artifact() {
        let bytes = zstd::stream::encode_all(&[0xff_u8, 0xfe, 0xfd][..], 3).unwrap();
        let result = decompress_text(&bytes);
        assert!(matches!(result, Err(DatapressError::CorruptArtifact(_))));
    }

    #[test]
    fn test_non_json_payload_is_malformed_value_model() {
        let bytes = compress_text("{not json").unwrap();
        let result = decompress_value(&bytes);
        assert!(matches!(result, Err(DatapressError::MalformedValueModel(_))));
    }

    #[test]
    fn test_canonical_sorts_nested_keys() {
        let value = json!({"zeta": {"b": 1, "a": 2}, "alpha": [{"d": 0, "c": 1}]});
        let bytes = compress_value(&value, true).unwrap();
        let text = decompress_text(&bytes).unwrap();
        assert_eq!(text, r#"{"alpha":[{"c":1,"d":0}],"zeta":{"a":2,"b":1}}"#);
    }

    #[test]
    fn test_non_canonical_keeps_insertion_order() {
        let value = json!({"zeta": 1, "alpha": 2});
        let bytes = compress_value(&value, false).unwrap();
        let text = decompress_text(&bytes).unwrap();
        assert_eq!(text, r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_value_roundtrip_both_modes() {
        let value = json!({
            "b": null,
            "a": [true, false, 1.5, -3, "x"],
            "nested": {"y": {"k": "v"}, "x": []}
        });
        for canonical in [true, false] {
            let bytes = compress_value(&value, canonical).unwrap();
            assert_eq!(decompress_value(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_arrays_keep_order_when_canonical() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonicalize(value.clone()), value);
    }

    #[test]
    fn test_timestamps_render_as_rfc3339() {
        #[derive(Serialize)]
        struct Stamped {
            at: chrono::DateTime<Utc>,
        }
        let stamped = Stamped {
            at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };
        let bytes = compress_serializable(&stamped, true).unwrap();
        let value = decompress_value(&bytes).unwrap();
        assert_eq!(value, json!({"at": "2024-03-01T12:00:00Z"}));
    }

    #[test]
    fn test_typed_roundtrip() {
        let rows: Vec<(u32, String)> = vec![(1, "a@x.com".to_owned()), (2, "b@x.com".to_owned())];
        let bytes = compress_serializable(&rows, true).unwrap();
        let back: Vec<(u32, String)> = decompress_deserializable(&bytes).unwrap();
        assert_eq!(back, rows);
    }
}
