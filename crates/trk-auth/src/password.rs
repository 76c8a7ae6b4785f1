//! Password hashing and verification
//!
//! Argon2id with a per-hash random salt. Verification goes through the
//! library's constant-time comparison; the plaintext is never stored.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use thiserror::Error;

/// Password handling errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Outcome of a password check against a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Hash matched
    Verified,
    /// Hash present but did not match
    Mismatch,
    /// No hash stored; the account authenticates via federation only
    OAuthOnly,
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against an optionally-stored hash.
///
/// A `None` hash means the account was created through federation; the web
/// flow shows a distinct "sign in with Google" message for that case instead
/// of a generic credential failure.
pub fn verify_password(stored_hash: Option<&str>, password: &str) -> VerifyOutcome {
    let Some(stored) = stored_hash else {
        return VerifyOutcome::OAuthOnly;
    };

    let Ok(parsed) = PasswordHash::new(stored) else {
        // unparseable hash: treat as mismatch, never as a pass
        return VerifyOutcome::Mismatch;
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => VerifyOutcome::Verified,
        Err(_) => VerifyOutcome::Mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pw123456").unwrap();
        assert_ne!(hash, "pw123456");
        assert_eq!(verify_password(Some(&hash), "pw123456"), VerifyOutcome::Verified);
        assert_eq!(verify_password(Some(&hash), "wrong"), VerifyOutcome::Mismatch);
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("pw123456").unwrap();
        let b = hash_password("pw123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_oauth_only_account() {
        assert_eq!(verify_password(None, "anything"), VerifyOutcome::OAuthOnly);
    }

    #[test]
    fn test_garbage_hash_is_mismatch() {
        assert_eq!(
            verify_password(Some("not-a-phc-string"), "pw"),
            VerifyOutcome::Mismatch
        );
    }
}
