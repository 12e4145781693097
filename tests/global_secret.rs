//! Implicit process-key setup from the environment.
//!
//! Kept in its own test binary with a single test: it changes the process
//! environment and the process-wide key slot.

use datapress::error::Result;
use datapress::secret::{SECRET_ENV_VAR, TokenCipher, global};
use secrecy::SecretString;

#[test]
#[expect(unsafe_code)]
fn test_implicit_init_from_environment() -> Result<()> {
    // SAFETY: this binary runs one test, so no other thread reads the
    // environment while it is modified.
    unsafe {
        std::env::set_var(SECRET_ENV_VAR, "41424344");
    }
    assert!(!global::is_keyed());

    let token = global::encrypt("hello world")?;
    assert!(global::is_keyed());
    assert_eq!(global::decrypt(&token)?, "hello world");

    // Same key as an explicit cipher built from the same secret
    let explicit = TokenCipher::from_secret(&SecretString::new("41424344".into()))?;
    assert_eq!(explicit.decrypt(&token)?, "hello world");

    // Once keyed, a later explicit secret is ignored
    global::init_secret(Some("a different secret"))?;
    assert_eq!(global::decrypt(&token)?, "hello world");
    Ok(())
}
