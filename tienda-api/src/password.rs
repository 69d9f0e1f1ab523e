// Password hashing and verification

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};
use zocalo_core::Error;

/// Algorithm used for new hashes. Verification accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Bcrypt,
    Argon2,
}

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    algorithm: HashAlgorithm,
    bcrypt_cost: u32,
}

impl PasswordHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn hash(&self, password: &str) -> Result<String, Error> {
        match self.algorithm {
            HashAlgorithm::Bcrypt => bcrypt::hash(password, self.bcrypt_cost)
                .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e))),
            HashAlgorithm::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
            }
        }
    }

    /// Check `password` against a stored hash.
    ///
    /// The algorithm is read from the hash prefix, so rows written by older
    /// deployments (`$2y$` bcrypt) keep working. Unknown formats never match.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if hash.starts_with("$2") {
            bcrypt::verify(password, hash).unwrap_or(false)
        } else if hash.starts_with("$argon2") {
            PasswordHash::new(hash)
                .map(|parsed| {
                    Argon2::default()
                        .verify_password(password.as_bytes(), &parsed)
                        .is_ok()
                })
                .unwrap_or(false)
        } else {
            false
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::Argon2)
    }
}
