//! Delete recording command
//!
//! Deletion cascades to transcription jobs through the foreign key; any
//! provider job still in flight is simply abandoned, since the provider has
//! no cancellation API. The disk file is removed after the row so a failed
//! delete never leaves a row pointing at nothing.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::path::PathBuf;
use uuid::Uuid;

use crate::storage::Storage;

/// Command to delete a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRecordingCommand {
    pub recording_id: Uuid,
    pub user_id: Uuid,
}

/// Errors that can occur when deleting
#[derive(Debug, thiserror::Error)]
pub enum DeleteRecordingError {
    #[error("Recording not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct DeletedRecording {
    storage_path: String,
}

/// Handler for recording deletion
#[tracing::instrument(skip_all, fields(recording_id = %command.recording_id, user_id = %command.user_id))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: DeleteRecordingCommand,
) -> Result<(), DeleteRecordingError> {
    let deleted = sqlx::query_as::<_, DeletedRecording>(
        r#"
        DELETE FROM recordings
        WHERE id = $1 AND user_id = $2
        RETURNING storage_path
        "#,
    )
    .bind(command.recording_id)
    .bind(command.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(DeleteRecordingError::NotFound)?;

    if let Err(e) = storage.remove(&PathBuf::from(deleted.storage_path)).await {
        tracing::warn!("Failed to remove recording file: {}", e);
    }

    tracing::info!("Recording deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_fields() {
        let recording_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let command = DeleteRecordingCommand {
            recording_id,
            user_id,
        };
        assert_eq!(command.recording_id, recording_id);
        assert_eq!(command.user_id, user_id);
    }
}
