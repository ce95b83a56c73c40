//! List recordings query

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Query for the caller's recordings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRecordingsQuery {
    pub user_id: Uuid,
}

/// One recording in a listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecordingSummary {
    pub id: Uuid,
    pub file_name: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

pub async fn handle(
    pool: PgPool,
    query: ListRecordingsQuery,
) -> Result<Vec<RecordingSummary>, sqlx::Error> {
    sqlx::query_as::<_, RecordingSummary>(
        r#"
        SELECT id, file_name, size_bytes, uploaded_at
        FROM recordings
        WHERE user_id = $1
        ORDER BY uploaded_at DESC
        "#,
    )
    .bind(query.user_id)
    .fetch_all(&pool)
    .await
}
