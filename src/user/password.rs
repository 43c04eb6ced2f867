use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::{debug, warn};

use crate::shared::AppError;

/// Hashes and verifies passwords with Argon2id
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(argon2: Argon2<'static>) -> Self {
        Self { argon2 }
    }

    /// Minimal-cost parameters for tests and local development
    pub fn low_cost() -> Self {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .unwrap_or_default();
        Self::new(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Returns the PHC string (algorithm, parameters, salt and hash)
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                warn!(error = %e, "Failed to hash password");
                AppError::Internal
            })
    }

    /// Parameters are read from the stored hash, so hashes made under other settings still verify
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is unreadable");
                return false;
            }
        };

        let matches = self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        debug!(matches, "Password verification finished");
        matches
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(Argon2::default())
    }
}
