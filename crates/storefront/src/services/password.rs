//! Password hashing.
//!
//! Argon2id with a fresh random salt per hash. Digests are stored in PHC
//! string format, so the parameters used at signup travel with the hash and
//! verification keeps working after the configured cost changes.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

use crate::config::HashingConfig;

/// Errors raised while hashing.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The configured cost parameters were rejected by Argon2.
    #[error("invalid hashing parameters: {0}")]
    Params(String),

    /// Hashing itself failed.
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// One-way password hasher.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher from cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Params` if Argon2 rejects the parameters.
    pub fn new(config: &HashingConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| PasswordError::Params(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a random salt.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Hash` if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check a password against a stored digest.
    ///
    /// A digest that cannot be parsed never verifies.
    #[must_use]
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::new(&HashingConfig {
            memory_kib: HashingConfig::MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap();
        let digest = hasher.hash("secret1").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(!digest.contains("secret1"));
        assert!(hasher.verify("secret1", &digest));
        assert!(!hasher.verify("secret2", &digest));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = cheap();
        let a = hasher.hash("secret1").unwrap();
        let b = hasher.hash("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_uses_stored_parameters() {
        let digest = cheap().hash("secret1").unwrap();
        let stronger = PasswordHasher::new(&HashingConfig::default()).unwrap();
        assert!(stronger.verify("secret1", &digest));
    }

    #[test]
    fn test_garbage_digest_never_verifies() {
        assert!(!cheap().verify("secret1", "not-a-hash"));
    }
}
