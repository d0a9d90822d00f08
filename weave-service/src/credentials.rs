//! Credential hashing.
//!
//! Wraps Argon2id PHC-string hashing so the rest of the service sees
//! only an opaque `hash` / `verify` capability. The digest embeds its
//! own salt and parameters; nothing else is stored.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use thiserror::Error;

/// Credential hashing errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Producing a digest failed.
    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext secret into a PHC string.
pub fn hash_password(plain: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Verify a plaintext secret against a stored digest.
///
/// A malformed stored digest verifies as false rather than erroring:
/// from the caller's perspective it is simply not the right password.
pub fn verify_password(digest: &str, plain: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
