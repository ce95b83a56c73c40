//! Authentication: JWT issuance/validation, password hashing, and the
//! request extractor that resolves the authenticated user.

use thiserror::Error;

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::AuthUser;
pub use jwt::{Claims, JwtAuth};

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token format (expected 'Bearer <token>')")]
    InvalidFormat,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
