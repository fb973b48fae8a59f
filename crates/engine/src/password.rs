//! Password hashing with argon2id (PHC string format).

use argon2::Argon2;
use password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::{EngineError, ResultEngine};

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

/// Verify a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub(crate) fn validate_new_password(password: &str) -> ResultEngine<()> {
    if password.trim().is_empty() {
        return Err(EngineError::Invalid("password must not be empty".to_string()));
    }
    Ok(())
}
