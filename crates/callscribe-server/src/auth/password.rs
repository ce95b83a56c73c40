//! Password hashing with bcrypt
//!
//! Hashing is CPU-bound, so both operations run on the blocking thread pool.

use bcrypt::{hash, verify, DEFAULT_COST};

use super::AuthError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length (bcrypt truncates at 72 bytes)
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        hash(password, DEFAULT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {}", e)))?
}

/// Verify a password against a stored hash
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();

    tokio::task::spawn_blocking(move || {
        verify(password, &stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("correct horse battery").await.unwrap();

        assert!(verify_password("correct horse battery", &hashed).await.unwrap());
        assert!(!verify_password("wrong password", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let first = hash_password("same input").await.unwrap();
        let second = hash_password("same input").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_stored_hash_errors() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").await.is_err());
    }
}
