//! Authenticated-user extractor for protected routes

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use super::AuthError;
use crate::error::AppError;
use crate::features::FeatureState;

/// The resolved identity behind a bearer token
///
/// The user row is loaded on every request, so a deleted account is locked
/// out as soon as its row is gone even if its token has not expired.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub identifier: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    identifier: String,
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

#[async_trait]
impl FromRequestParts<FeatureState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FeatureState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let claims = state
            .jwt
            .verify(token)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, identifier FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            identifier: user.identifier,
        })
    }
}
