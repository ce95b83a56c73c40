//! Shared validation utilities
//!
//! Common validation functions for input data across commands and queries.

use thiserror::Error;

use crate::auth::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Errors that can occur during name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Name is required and cannot be empty")]
    Required,

    #[error("Name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Errors that can occur during identifier validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierValidationError {
    #[error("Email or phone number is required")]
    Required,

    #[error("Identifier must not exceed {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Identifier must be a valid email address or phone number")]
    InvalidFormat,
}

/// Errors that can occur during password validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordValidationError {
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    #[error("Password must not exceed {MAX_PASSWORD_LENGTH} characters")]
    TooLong,
}

/// How a user chose to identify themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Email,
    Phone,
}

impl IdentifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Email => "email",
            IdentifierKind::Phone => "phone",
        }
    }
}

/// Validate a display name
pub fn validate_name(name: &str, max_length: usize) -> Result<(), NameValidationError> {
    if name.trim().is_empty() {
        return Err(NameValidationError::Required);
    }

    if name.len() > max_length {
        return Err(NameValidationError::TooLong { max_length });
    }

    Ok(())
}

/// Validate a login identifier and classify it as email or phone
///
/// Anything containing '@' is held to email shape; otherwise it must look
/// like a phone number (digits plus common separators, at least five digits).
pub fn validate_identifier(identifier: &str) -> Result<IdentifierKind, IdentifierValidationError> {
    let identifier = identifier.trim();

    if identifier.is_empty() {
        return Err(IdentifierValidationError::Required);
    }

    if identifier.len() > 254 {
        return Err(IdentifierValidationError::TooLong { max_length: 254 });
    }

    if identifier.contains('@') {
        let mut parts = identifier.splitn(2, '@');
        let local = parts.next().unwrap_or("");
        let domain = parts.next().unwrap_or("");

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(IdentifierValidationError::InvalidFormat);
        }

        return Ok(IdentifierKind::Email);
    }

    let digits = identifier.chars().filter(|c| c.is_ascii_digit()).count();
    let only_phone_chars = identifier
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));

    if digits >= 5 && only_phone_chars {
        Ok(IdentifierKind::Phone)
    } else {
        Err(IdentifierValidationError::InvalidFormat)
    }
}

/// Validate a password against the bcrypt-imposed bounds
pub fn validate_password(password: &str) -> Result<(), PasswordValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooShort);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooLong);
    }

    Ok(())
}
