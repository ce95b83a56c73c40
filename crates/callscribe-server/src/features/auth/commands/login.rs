//! Login command
//!
//! Unknown identifiers and wrong passwords produce the same error so the
//! response does not reveal which accounts exist.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{password, AuthError, JwtAuth};
use crate::features::auth::UserProfile;

/// Command to log in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    /// Email address or phone number
    pub identifier: String,

    /// Plain text password
    #[serde(skip_serializing)]
    pub password: String,
}

/// Response from logging in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Errors that can occur when logging in
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    name: String,
    identifier: String,
    password_hash: String,
}

/// Handler for login
#[tracing::instrument(skip(pool, jwt, command), fields(identifier = %command.identifier))]
pub async fn handle(
    pool: PgPool,
    jwt: &JwtAuth,
    command: LoginCommand,
) -> Result<LoginResponse, LoginError> {
    let user = sqlx::query_as::<_, CredentialRow>(
        r#"
        SELECT id, name, identifier, password_hash
        FROM users
        WHERE identifier = $1
        "#,
    )
    .bind(command.identifier.trim())
    .fetch_optional(&pool)
    .await?
    .ok_or(LoginError::InvalidCredentials)?;

    let matches = password::verify_password(&command.password, &user.password_hash).await?;
    if !matches {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(LoginError::InvalidCredentials);
    }

    let token = jwt.issue(user.id)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(LoginResponse {
        token,
        user: UserProfile {
            id: user.id,
            name: user.name,
            identifier: user.identifier,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_never_serialized() {
        let command = LoginCommand {
            identifier: "alice@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        let serialized = serde_json::to_string(&command).unwrap();
        assert!(!serialized.contains("hunter22"));
    }

    #[test]
    fn test_error_messages_do_not_distinguish() {
        // Same display text regardless of which check failed
        assert_eq!(LoginError::InvalidCredentials.to_string(), "Invalid credentials");
    }
}
