//! In-place redaction of free-text fields.
//!
//! A field that [`has_pii`] flags is replaced by an encrypted token and the
//! record is marked redacted. Loading with a cipher reverses that; loading
//! without one leaves token and mark untouched so the record can still be
//! aggregated.

use crate::error::{DatapressError, Result};
use crate::pii::has_pii;
use crate::secret::TokenCipher;

/// Records that carry redactable free text.
///
/// The default methods describe a record with nothing to redact.
pub trait Redact {
    /// Encrypt flagged fields. Returns whether anything was replaced.
    ///
    /// # Errors
    ///
    /// [`DatapressError::MissingSecret`] when a field needs encrypting and no
    /// cipher was supplied.
    fn redact(&mut self, _cipher: Option<&TokenCipher>) -> Result<bool> {
        Ok(false)
    }

    /// Decrypt fields redacted earlier and clear the mark.
    fn reveal(&mut self, _cipher: &TokenCipher) -> Result<()> {
        Ok(())
    }

    fn is_redacted(&self) -> bool {
        false
    }
}

/// Token for `text` when it contains PII, `None` when it can stay as is.
pub fn redact_text(text: &str, cipher: Option<&TokenCipher>) -> Result<Option<String>> {
    if !has_pii(text) {
        return Ok(None);
    }
    let cipher = cipher.ok_or(DatapressError::MissingSecret)?;
    cipher.encrypt(text).map(Some)
}

/// Inverse of [`redact_text`]. Authentication failures propagate.
pub fn reveal_text(token: &str, cipher: &TokenCipher) -> Result<String> {
    cipher.decrypt(token)
}

/// Redact every record, returning how many were changed.
pub fn redact_all<R: Redact>(records: &mut [R], cipher: Option<&TokenCipher>) -> Result<usize> {
    let mut changed = 0;
    for record in records.iter_mut() {
        if record.redact(cipher)? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Reveal every redacted record; a no-op without a cipher.
pub fn reveal_all<R: Redact>(records: &mut [R], cipher: Option<&TokenCipher>) -> Result<usize> {
    let Some(cipher) = cipher else {
        return Ok(0);
    };
    let mut revealed = 0;
    for record in records.iter_mut().filter(|r| r.is_redacted()) {
        record.reveal(cipher)?;
        revealed += 1;
    }
    Ok(revealed)
}
