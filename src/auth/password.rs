//! Password hashing for Gotcha.
//!
//! Uses Argon2id behind the [`CredentialVerifier`] capability, so the rest of
//! the crate never touches the hashing primitive directly.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::OsRng;

use crate::config::AuthConfig;
use crate::{GotchaError, Result};

/// Turns passwords into stored verifiers and checks them.
pub trait CredentialVerifier: Send + Sync {
    /// Produce a verifier string for `password`.
    fn hash(&self, password: &str) -> Result<String>;

    /// Check `password` against a verifier produced by [`hash`](Self::hash).
    ///
    /// A wrong password is `Ok(false)`; only a malformed verifier is an error.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id credential verifier.
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    params: Params,
}

impl Argon2Verifier {
    /// Create a verifier with the configured cost parameters.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Self::with_params(config.memory_cost_kib, config.time_cost, config.parallelism)
    }

    /// Create a verifier with explicit cost parameters.
    ///
    /// - `memory_cost_kib`: memory cost in KiB
    /// - `time_cost`: iterations
    /// - `parallelism`: lanes
    pub fn with_params(memory_cost_kib: u32, time_cost: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_cost_kib, time_cost, parallelism, None)
            .map_err(|e| GotchaError::Config(format!("invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(hashing_failed)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|_| GotchaError::Corrupted("invalid password hash format".to_string()))?;

        // Parameters come from the stored hash, not from self.params
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn hashing_failed(e: argon2::password_hash::Error) -> GotchaError {
    GotchaError::Credential(format!("password hashing failed: {e}"))
}
