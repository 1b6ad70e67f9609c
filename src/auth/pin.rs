//! PIN hashing and verification.

use crate::errors::{AppResult, AuthError};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::debug;

/// Hashes PINs for storage and checks candidates against stored hashes.
pub trait PinVerifier: Send + Sync {
    /// Produces a self-describing hash suitable for storage.
    fn hash_pin(&self, pin: &str) -> AppResult<String>;

    /// Returns true if `candidate` matches `stored_hash`. A malformed hash
    /// never matches.
    fn verify_pin(&self, candidate: &str, stored_hash: &str) -> bool;
}

/// Argon2id with default parameters and a random salt per hash, stored in
/// PHC string format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PinVerifier;

impl PinVerifier for Argon2PinVerifier {
    fn hash_pin(&self, pin: &str) -> AppResult<String> {
        if pin.is_empty() {
            return Err(AuthError::EmptyPin.into());
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify_pin(&self, candidate: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Stored PIN hash is malformed: {}", e);
                return false;
            }
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}
