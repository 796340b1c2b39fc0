use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SALT_LENGTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stored password hash is malformed")]
pub struct PasswordHashError;

/// Hashes `password` with a fresh random salt. The result has the form `salt$hex(sha256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    let salt: String = thread_rng().sample_iter(&Alphanumeric).take(SALT_LENGTH).map(char::from).collect();
    format!("{salt}${}", digest(&salt, password))
}

/// Checks `password` against a hash produced by [`hash_password`].
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordHashError> {
    let (salt, expected) = stored.split_once('$').ok_or(PasswordHashError)?;
    if salt.is_empty() || expected.is_empty() {
        return Err(PasswordHashError);
    }
    Ok(digest(salt, password) == expected)
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
