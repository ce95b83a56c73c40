//! Upload recording command
//!
//! Writes the audio bytes to disk first and only then inserts the row, so a
//! recording row always points at an existing file. If the insert fails the
//! freshly written file is removed again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use callscribe_common::CallscribeError;

use crate::storage::Storage;

/// Command to upload a call recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecordingCommand {
    pub user_id: Uuid,

    /// Original filename as sent by the client
    pub file_name: String,

    /// MIME type from the multipart field, if any
    pub content_type: Option<String>,

    /// Raw audio bytes
    #[serde(skip)]
    pub content: Vec<u8>,

    /// Size cap from configuration
    #[serde(skip)]
    pub max_bytes: usize,
}

/// Response from uploading a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecordingResponse {
    pub id: Uuid,
    pub file_name: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Errors that can occur when uploading
#[derive(Debug, thiserror::Error)]
pub enum UploadRecordingError {
    #[error("Filename is required and cannot be empty")]
    FilenameRequired,

    #[error("Filename must not exceed 255 characters")]
    FilenameLength,

    #[error("File is empty")]
    ContentRequired,

    #[error("File exceeds the maximum size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },

    #[error("Only audio files are allowed")]
    NotAudio,

    #[error("Storage error: {0}")]
    Storage(#[from] CallscribeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UploadRecordingCommand {
    pub fn validate(&self) -> Result<(), UploadRecordingError> {
        if self.file_name.trim().is_empty() {
            return Err(UploadRecordingError::FilenameRequired);
        }
        if self.file_name.len() > 255 {
            return Err(UploadRecordingError::FilenameLength);
        }
        if self.content.is_empty() {
            return Err(UploadRecordingError::ContentRequired);
        }
        if self.content.len() > self.max_bytes {
            return Err(UploadRecordingError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        match self.content_type.as_deref() {
            Some(content_type) if content_type.starts_with("audio/") => Ok(()),
            _ => Err(UploadRecordingError::NotAudio),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InsertedRecording {
    id: Uuid,
    file_name: String,
    size_bytes: i64,
    uploaded_at: DateTime<Utc>,
}

/// Handler for recording uploads
#[tracing::instrument(skip(pool, storage, command), fields(user_id = %command.user_id, file_name = %command.file_name))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: UploadRecordingCommand,
) -> Result<UploadRecordingResponse, UploadRecordingError> {
    command.validate()?;

    let stored = storage.store(&command.file_name, &command.content).await?;

    let inserted = sqlx::query_as::<_, InsertedRecording>(
        r#"
        INSERT INTO recordings (id, user_id, file_name, storage_path, size_bytes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, file_name, size_bytes, uploaded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(command.user_id)
    .bind(command.file_name.trim())
    .bind(stored.path.to_string_lossy().into_owned())
    .bind(stored.size)
    .fetch_one(&pool)
    .await;

    let inserted = match inserted {
        Ok(row) => row,
        Err(e) => {
            // Do not leave an orphaned file behind the failed insert.
            if let Err(cleanup) = storage.remove(&stored.path).await {
                tracing::warn!("Failed to clean up orphaned upload: {}", cleanup);
            }
            return Err(UploadRecordingError::Database(e));
        },
    };

    tracing::info!(
        recording_id = %inserted.id,
        size = inserted.size_bytes,
        "Recording uploaded"
    );

    Ok(UploadRecordingResponse {
        id: inserted.id,
        file_name: inserted.file_name,
        size_bytes: inserted.size_bytes,
        uploaded_at: inserted.uploaded_at,
    })
}
