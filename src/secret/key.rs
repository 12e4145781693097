//! Secret parsing and content-key derivation.

use crate::error::{DatapressError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hkdf::Hkdf;
use secrecy::{ExposeSecret as _, SecretBox, SecretString};
use sha2::Sha256;

/// Length of the AES-256 content key.
pub const KEY_LEN: usize = 32;

/// Environment variable consulted when no secret is passed explicitly.
pub const SECRET_ENV_VAR: &str = "DATAPRESS_SECRET";

// Fixed and non-secret. Writers and readers must agree on both.
const HKDF_SALT: &[u8] = b"datapress/token-key/salt/v1";
const HKDF_INFO: &[u8] = b"datapress/token-key/aes-256-gcm";

/// How the secret text was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialEncoding {
    Hex,
    Base64,
    Utf8,
}

/// Decode secret text into raw key material.
///
/// Priority: even-length hex, then base64 (standard or url-safe alphabet,
/// padding optional), then the UTF-8 bytes of the text itself. A base64
/// decode that fails or yields nothing falls through to UTF-8.
///
/// # Errors
///
/// [`DatapressError::MissingSecret`] if the text is empty after trimming.
pub fn parse_material(raw: &str) -> Result<(Vec<u8>, MaterialEncoding)> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DatapressError::MissingSecret);
    }

    if text.len() % 2 == 0
        && text.bytes().all(|b| b.is_ascii_hexdigit())
        && let Ok(bytes) = hex::decode(text)
    {
        return Ok((bytes, MaterialEncoding::Hex));
    }

    if let Some(bytes) = decode_base64_lenient(text) {
        return Ok((bytes, MaterialEncoding::Base64));
    }

    Ok((text.as_bytes().to_vec(), MaterialEncoding::Utf8))
}

fn decode_base64_lenient(text: &str) -> Option<Vec<u8>> {
    let standard: String = text
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let unpadded = standard.trim_end_matches('=');
    let padding = (4 - unpadded.len() % 4) % 4;
    let padded = format!("{unpadded}{}", "=".repeat(padding));

    STANDARD.decode(padded).ok().filter(|bytes| !bytes.is_empty())
}

/// A 32-byte symmetric key, zeroized on drop.
pub struct ContentKey(SecretBox<[u8; KEY_LEN]>);

impl ContentKey {
    /// Derive a key from operator secret text.
    ///
    /// Material that decodes to exactly 32 bytes is used as the key directly;
    /// anything else goes through HKDF-SHA256 with fixed salt and info.
    pub fn from_secret(secret: &SecretString) -> Result<Self> {
        let (material, encoding) = parse_material(secret.expose_secret())?;
        tracing::debug!(
            ?encoding,
            material_len = material.len(),
            "parsed secret material"
        );
        Self::from_material(&material)
    }

    /// Build a key from already-decoded material.
    pub fn from_material(material: &[u8]) -> Result<Self> {
        if material.is_empty() {
            return Err(DatapressError::MissingSecret);
        }

        let mut key = Box::new([0u8; KEY_LEN]);
        if material.len() == KEY_LEN {
            key.copy_from_slice(material);
        } else {
            Hkdf::<Sha256>::new(Some(HKDF_SALT), material)
                .expand(HKDF_INFO, key.as_mut_slice())
                .map_err(|e| DatapressError::Other(format!("key derivation failed: {e}")))?;
        }

        Ok(Self(SecretBox::new(key)))
    }

    /// Read the secret from [`SECRET_ENV_VAR`].
    pub fn from_env() -> Result<Self> {
        Self::from_source(std::env::var(SECRET_ENV_VAR).ok())
    }

    /// Build a key from an optional secret source, failing when it is absent.
    pub fn from_source(source: Option<String>) -> Result<Self> {
        let raw = source.ok_or(DatapressError::MissingSecret)?;
        Self::from_secret(&SecretString::new(raw.into()))
    }

    pub(crate) fn bytes(&self) -> &[u8; KEY_LEN] {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContentKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.into())
    }

    #[test]
    fn test_hex_material() {
        let (bytes, encoding) = parse_material("41424344").unwrap();
        assert_eq!(bytes, b"ABCD");
        assert_eq!(encoding, MaterialEncoding::Hex);
    }

    #[test]
    fn test_odd_length_hex_is_not_hex() {
        let (_, encoding) = parse_material("4142434").unwrap();
        assert_ne!(encoding, MaterialEncoding::Hex);
    }

    #[test]
    fn test_base64url_material_without_padding() {
        // 0xfb 0xff encodes to "-_8" in the url-safe alphabet
        let (bytes, encoding) = parse_material("-_8").unwrap();
        assert_eq!(bytes, vec![0xfb, 0xff]);
        assert_eq!(encoding, MaterialEncoding::Base64);
    }

    #[test]
    fn test_standard_base64_material() {
        let (bytes, encoding) = parse_material("aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(encoding, MaterialEncoding::Base64);
    }

    #[test]
    fn test_plain_text_material() {
        let (bytes, encoding) = parse_material("  correct horse battery staple ").unwrap();
        assert_eq!(bytes, b"correct horse battery staple");
        assert_eq!(encoding, MaterialEncoding::Utf8);
    }

    #[test]
    fn test_blank_secret_is_missing() {
        assert!(matches!(
            parse_material("   "),
            Err(DatapressError::MissingSecret)
        ));
        assert!(matches!(
            ContentKey::from_source(None),
            Err(DatapressError::MissingSecret)
        ));
    }

    #[test]
    fn test_32_byte_material_used_directly() {
        let raw = [7u8; KEY_LEN];
        let key = ContentKey::from_secret(&secret(&hex::encode(raw))).unwrap();
        assert_eq!(key.bytes(), &raw);
    }

    #[test]
    fn test_short_material_is_derived_deterministically() {
        let a = ContentKey::from_secret(&secret("41424344")).unwrap();
        let b = ContentKey::from_secret(&secret("41424344")).unwrap();
        let c = ContentKey::from_secret(&secret("41424345")).unwrap();
        assert_eq!(a.bytes(), b.bytes());
        assert_ne!(a.bytes(), c.bytes());
        assert_ne!(&a.bytes()[..4], b"ABCD");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = ContentKey::from_secret(&secret("41424344")).unwrap();
        assert_eq!(format!("{key:?}"), "ContentKey([REDACTED])");
    }
}
