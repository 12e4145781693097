//! Process-wide token key.
//!
//! The slot moves from empty to keyed exactly once. Later calls to
//! [`init_secret`] return the existing cipher and ignore their argument, so a
//! key can never be rotated without restarting the process.
//!
//! Prefer constructing a [`TokenCipher`] and passing it down; this slot exists
//! for call sites that cannot be threaded.

use super::token::TokenCipher;
use crate::error::Result;
use secrecy::SecretString;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

static PROCESS_CIPHER: LazyLock<Mutex<Option<Arc<TokenCipher>>>> =
    LazyLock::new(|| Mutex::new(None));

fn slot() -> MutexGuard<'static, Option<Arc<TokenCipher>>> {
    // The slot only ever holds a fully built cipher, so a poisoned lock is still consistent.
    PROCESS_CIPHER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Establish the process key, or return the one already established.
///
/// With `None`, the secret is read from `DATAPRESS_SECRET`.
///
/// # Errors
///
/// [`crate::error::DatapressError::MissingSecret`] when no key exists yet and
/// no material is available.
pub fn init_secret(material: Option<&str>) -> Result<Arc<TokenCipher>> {
    let mut guard = slot();
    if let Some(existing) = guard.as_ref() {
        if material.is_some() {
            tracing::debug!("process key already established; ignoring new secret");
        }
        return Ok(Arc::clone(existing));
    }

    let cipher = match material {
        Some(raw) => TokenCipher::from_secret(&SecretString::new(raw.into()))?,
        None => TokenCipher::from_env()?,
    };
    let cipher = Arc::new(cipher);
    *guard = Some(Arc::clone(&cipher));
    tracing::info!("process token key established");

    Ok(cipher)
}

/// Whether a process key has been established.
pub fn is_keyed() -> bool {
    slot().is_some()
}

/// Encrypt with the process key, establishing it from the environment first
/// if needed.
pub fn encrypt(plaintext: &str) -> Result<String> {
    init_secret(None)?.encrypt(plaintext)
}

/// Decrypt with the process key, establishing it from the environment first
/// if needed.
pub fn decrypt(token: &str) -> Result<String> {
    init_secret(None)?.decrypt(token)
}

/// Drop the process key. Only for tests.
#[doc(hidden)]
pub fn reset_for_tests() {
    *slot() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatapressError;

    // The slot is process-wide; serialize the tests that touch it.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn test_first_init_wins() {
        let _guard = serial();
        reset_for_tests();

        let first = init_secret(Some("41424344")).unwrap();
        let token = first.encrypt("kept").unwrap();

        let second = init_secret(Some("a completely different secret")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(decrypt(&token).unwrap(), "kept");

        reset_for_tests();
    }

    #[test]
    fn test_blank_material_leaves_slot_empty() {
        let _guard = serial();
        reset_for_tests();

        let result = init_secret(Some("   "));
        assert!(matches!(result, Err(DatapressError::MissingSecret)));
        assert!(!is_keyed());
    }

    #[test]
    fn test_implicit_init_without_env_is_missing_secret() {
        let _guard = serial();
        reset_for_tests();

        if std::env::var(crate::secret::SECRET_ENV_VAR).is_err() {
            assert!(matches!(
                encrypt("anything"),
                Err(DatapressError::MissingSecret)
            ));
            assert!(!is_keyed());
        }
    }

    #[test]
    fn test_reset_allows_new_key() {
        let _guard = serial();
        reset_for_tests();

        let token = init_secret(Some("41424344"))
            .unwrap()
            .encrypt("rotated")
            .unwrap();
        reset_for_tests();
        init_secret(Some("deadbeef")).unwrap();

        assert!(matches!(
            decrypt(&token),
            Err(DatapressError::AuthenticationFailed)
        ));
        reset_for_tests();
    }
}
