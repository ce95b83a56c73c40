//! Profile query

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Query for the authenticated user's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProfileQuery {
    pub user_id: Uuid,
}

/// Full profile view
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileView {
    pub id: Uuid,
    pub name: String,
    pub identifier: String,
    pub identifier_type: String,
    pub created_at: DateTime<Utc>,
}

/// Error type for profile query
#[derive(Debug, thiserror::Error)]
pub enum GetProfileError {
    #[error("User not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn handle(pool: PgPool, query: GetProfileQuery) -> Result<ProfileView, GetProfileError> {
    let profile = sqlx::query_as::<_, ProfileView>(
        r#"
        SELECT id, name, identifier, identifier_type, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(query.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetProfileError::NotFound)?;

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_carries_user_id() {
        let user_id = Uuid::new_v4();
        let query = GetProfileQuery { user_id };
        assert_eq!(query.user_id, user_id);
    }
}
