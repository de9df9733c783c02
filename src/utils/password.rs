use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Password hashing failure
#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Hash a plain-text password with argon2 and a random salt (PHC string format)
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Check a plain-text password against a stored PHC hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordHashError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| PasswordHashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
