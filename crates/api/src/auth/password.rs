//! Password hashing with Argon2id
//!
//! One-way, salted, memory-hard. `verify_password` treats a malformed digest
//! as "password incorrect" rather than an error, and `is_digest` is the
//! tagged-value check behind the pre-save policy (a stored digest is never
//! re-hashed when a record is re-saved).

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{ApiError, ApiResult};

/// Hash a plaintext password. Failure here is fatal to the calling operation.
pub fn hash_password(plain: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored digest. A digest that fails
/// to parse verifies as false, never as an error.
pub fn verify_password(digest: &str, plain: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Whether `value` already parses as a PHC-format digest. Deliberately a
/// structural check rather than sniffing for an `$argon2` prefix, so the
/// policy survives an algorithm change.
pub fn is_digest(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}
