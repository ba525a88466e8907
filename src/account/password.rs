/// Password hashing and verification

use crate::error::{InventoryError, InventoryResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with Argon2id and a fresh random salt.
///
/// Returns the PHC string, which embeds the algorithm parameters and salt.
pub fn hash_password(password: &str) -> InventoryResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| InventoryError::PasswordHash(format!("hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> InventoryResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| InventoryError::PasswordHash(format!("parse hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool, off the async workers
pub async fn hash_password_blocking(password: &str) -> InventoryResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| InventoryError::Internal(format!("spawn password hashing task: {}", e)))?
}

/// [`verify_password`] on the blocking pool, off the async workers
pub async fn verify_password_blocking(password: &str, hash: &str) -> InventoryResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            InventoryError::Internal(format!("spawn password verification task: {}", e))
        })?
}
