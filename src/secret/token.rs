//! Versioned AES-256-GCM tokens.
//!
//! Layout of the decoded token: `version || nonce || ciphertext || tag`. The
//! AAD is the single version byte.

use super::key::ContentKey;
use crate::error::{DatapressError, Result};
use aes_gcm::aead::{Aead as _, KeyInit as _, Payload};
use aes_gcm::{Aes256Gcm, Key};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use rand::RngCore as _;
use rand::rngs::OsRng;
use secrecy::SecretString;

/// The only token version this build reads or writes.
pub const TOKEN_VERSION: u8 = 1;

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Url-safe alphabet; writes without padding, reads with or without it.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Seals and opens tokens under one content key.
///
/// Cheap to clone; safe to share between threads.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    pub fn new(key: &ContentKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.bytes())),
        }
    }

    /// Parse operator secret text and build a cipher from it.
    pub fn from_secret(secret: &SecretString) -> Result<Self> {
        Ok(Self::new(&ContentKey::from_secret(secret)?))
    }

    /// Build a cipher from the `DATAPRESS_SECRET` environment variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(&ContentKey::from_env()?))
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt(
                aes_gcm::Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &[TOKEN_VERSION],
                },
            )
            .map_err(|_| DatapressError::Other("AES-GCM encryption failed".to_owned()))?;

        let mut token = Vec::with_capacity(HEADER_LEN + sealed.len());
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&sealed);

        Ok(TOKEN_ENGINE.encode(token))
    }

    /// Open a token produced by [`TokenCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// - [`DatapressError::MalformedToken`]: not base64url, or too short
    /// - [`DatapressError::UnsupportedTokenVersion`]: checked before the tag
    /// - [`DatapressError::AuthenticationFailed`]: tag mismatch
    pub fn decrypt(&self, token: &str) -> Result<String> {
        let bytes = TOKEN_ENGINE
            .decode(token)
            .map_err(|e| DatapressError::MalformedToken(format!("invalid base64url: {e}")))?;

        if bytes.len() < HEADER_LEN + TAG_LEN {
            return Err(DatapressError::MalformedToken(format!(
                "token is {} bytes, need at least {}",
                bytes.len(),
                HEADER_LEN + TAG_LEN
            )));
        }

        let version = bytes[0];
        if version != TOKEN_VERSION {
            return Err(DatapressError::UnsupportedTokenVersion {
                found: version,
                supported: TOKEN_VERSION,
            });
        }

        let (header, sealed) = bytes.split_at(HEADER_LEN);
        if sealed.len() < TAG_LEN {
            return Err(DatapressError::MalformedToken(
                "ciphertext shorter than tag".to_owned(),
            ));
        }

        let opened = self
            .cipher
            .decrypt(
                aes_gcm::Nonce::from_slice(&header[1..]),
                Payload {
                    msg: sealed,
                    aad: &[version],
                },
            )
            .map_err(|_| DatapressError::AuthenticationFailed)?;

        String::from_utf8(opened)
            .map_err(|_| DatapressError::MalformedToken("plaintext is not UTF-8".to_owned()))
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher")
            .field("version", &TOKEN_VERSION)
            .finish_non_exhaustive()
    }
}

/// Decode a token without opening it. Exposed for tamper tests and tooling.
pub fn decode_raw(token: &str) -> Result<Vec<u8>> {
    TOKEN_ENGINE
        .decode(token)
        .map_err(|e| DatapressError::MalformedToken(format!("invalid base64url: {e}")))
}

/// Re-encode raw token bytes in the canonical unpadded form.
pub fn encode_raw(bytes: &[u8]) -> String {
    TOKEN_ENGINE.encode(bytes)
}
