//! Register command
//!
//! Creates a user account and issues the first token. The identifier is
//! classified as email or phone from its shape, matching what the login
//! form accepts.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{password, AuthError, JwtAuth};
use crate::features::auth::UserProfile;
use crate::features::shared::validation::{
    validate_identifier, validate_name, validate_password, IdentifierKind,
    IdentifierValidationError, NameValidationError, PasswordValidationError,
};

/// Command to register a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCommand {
    /// Display name
    pub name: String,

    /// Email address or phone number (unique)
    pub identifier: String,

    /// Plain text password; hashed before storage
    #[serde(skip_serializing)]
    pub password: String,
}

/// Response from registering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Errors that can occur when registering
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Name validation failed: {0}")]
    NameValidation(#[from] NameValidationError),

    #[error("Identifier validation failed: {0}")]
    IdentifierValidation(#[from] IdentifierValidationError),

    #[error("Password validation failed: {0}")]
    PasswordValidation(#[from] PasswordValidationError),

    #[error("An account with this email/phone already exists")]
    DuplicateIdentifier,

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RegisterCommand {
    /// Validates the command parameters and classifies the identifier
    pub fn validate(&self) -> Result<IdentifierKind, RegisterError> {
        validate_name(&self.name, 256)?;
        let kind = validate_identifier(&self.identifier)?;
        validate_password(&self.password)?;
        Ok(kind)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InsertedUser {
    id: Uuid,
    name: String,
    identifier: String,
}

/// Handler for registration
#[tracing::instrument(skip(pool, jwt, command), fields(identifier = %command.identifier))]
pub async fn handle(
    pool: PgPool,
    jwt: &JwtAuth,
    command: RegisterCommand,
) -> Result<RegisterResponse, RegisterError> {
    let kind = command.validate()?;

    let password_hash = password::hash_password(&command.password).await?;

    let user = sqlx::query_as::<_, InsertedUser>(
        r#"
        INSERT INTO users (name, identifier, identifier_type, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, identifier
        "#,
    )
    .bind(command.name.trim())
    .bind(command.identifier.trim())
    .bind(kind.as_str())
    .bind(&password_hash)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return RegisterError::DuplicateIdentifier;
            }
        }
        RegisterError::Database(e)
    })?;

    let token = jwt.issue(user.id)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(RegisterResponse {
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

    fn command(name: &str, identifier: &str, password: &str) -> RegisterCommand {
        RegisterCommand {
            name: name.to_string(),
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validation_success_email() {
        let kind = command("Alice", "alice@example.com", "password123")
            .validate()
            .unwrap();
        assert_eq!(kind, IdentifierKind::Email);
    }

    #[test]
    fn test_validation_success_phone() {
        let kind = command("Bob", "+7 900 123-45-67", "password123")
            .validate()
            .unwrap();
        assert_eq!(kind, IdentifierKind::Phone);
    }

    #[test]
    fn test_validation_empty_name() {
        assert!(matches!(
            command("", "alice@example.com", "password123").validate(),
            Err(RegisterError::NameValidation(_))
        ));
    }

    #[test]
    fn test_validation_bad_identifier() {
        assert!(matches!(
            command("Alice", "not valid", "password123").validate(),
            Err(RegisterError::IdentifierValidation(_))
        ));
    }

    #[test]
    fn test_validation_short_password() {
        assert!(matches!(
            command("Alice", "alice@example.com", "short").validate(),
            Err(RegisterError::PasswordValidation(_))
        ));
    }

    #[test]
    fn test_password_never_serialized() {
        let serialized =
            serde_json::to_string(&command("Alice", "alice@example.com", "password123")).unwrap();
        assert!(!serialized.contains("password123"));
    }
}
