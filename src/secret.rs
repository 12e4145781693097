//! Secret handling and the versioned token format used to redact fields.
//!
//! An operator supplies one secret per process (hex, base64/base64url, or
//! plain text). It is reduced to a 32-byte content key, and that key seals
//! short strings into self-describing tokens:
//!
//! ```text
//! base64url( version(1) || nonce(12) || ciphertext || tag(16) )
//! ```
//!
//! The version byte is also the AEAD associated data, so it cannot be
//! swapped without breaking the tag.
//!
//! ## Usage
//!
//! Build a [`TokenCipher`] once at startup and pass it down:
//!
//! ```
//! use datapress::secret::TokenCipher;
//! use secrecy::SecretString;
//!
//! let cipher = TokenCipher::from_secret(&SecretString::new("41424344".into()))?;
//! let token = cipher.encrypt("hello world")?;
//! assert_eq!(cipher.decrypt(&token)?, "hello world");
//! # Ok::<(), datapress::error::DatapressError>(())
//! ```
//!
//! [`global`] keeps a first-init-wins process key for callers that cannot
//! thread a cipher through.
//!
//! ## Architecture
//!
//! - [`key`]: secret parsing and key derivation
//! - [`token`]: token sealing and opening
//! - [`global`]: process-wide key slot

pub mod global;
pub mod key;
pub mod token;

pub use key::{ContentKey, KEY_LEN, MaterialEncoding, SECRET_ENV_VAR};
pub use token::{NONCE_LEN, TAG_LEN, TOKEN_VERSION, TokenCipher};
