//! Password hashing and verification (Argon2id, per-hash random salt).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::config::{ConfigError, PasswordConfig};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

// Hashed once at startup so a lookup miss still pays for a full verification.
const DUMMY_PASSWORD: &str = "gatekeep-timing-equalizer";

/// Hashes and verifies passwords. Cheap to clone.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl PasswordService {
    pub fn new(config: &PasswordConfig) -> Result<Self, ConfigError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| ConfigError::invalid("ARGON2 params", e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(DUMMY_PASSWORD.as_bytes(), &salt)
            .map_err(|e| ConfigError::invalid("ARGON2 params", e.to_string()))?
            .to_string();
        Ok(Self {
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hash with a fresh salt. Returns the PHC string (salt included).
    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// Constant-time check of `password` against a stored PHC string.
    /// An unparsable stored hash is a mismatch, not an error.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one verification for an account that does not exist. Always false.
    pub fn verify_dummy(&self, password: &str) -> bool {
        self.verify(password, &self.dummy_hash);
        false
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must contain a lowercase letter")]
    MissingLowercase,
    #[error("password must contain an uppercase letter")]
    MissingUppercase,
    #[error("password must contain a digit")]
    MissingDigit,
    #[error("password must contain a non-alphanumeric character")]
    MissingSymbol,
}

/// Minimum strength rules for new passwords.
pub fn check_password_policy(password: &str) -> Result<(), PolicyViolation> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PolicyViolation::TooShort);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(PolicyViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PolicyViolation::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PolicyViolation::MissingDigit);
    }
    if password.chars().all(|c| c.is_alphanumeric()) {
        return Err(PolicyViolation::MissingSymbol);
    }
    Ok(())
}
