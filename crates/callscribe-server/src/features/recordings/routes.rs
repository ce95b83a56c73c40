//! Recording routes

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use super::commands::{
    delete::handle as handle_delete, upload::handle as handle_upload, DeleteRecordingCommand,
    DeleteRecordingError, UploadRecordingCommand, UploadRecordingError,
};
use super::queries::{list::handle as handle_list, ListRecordingsQuery};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::features::FeatureState;

/// Create recording routes
///
/// The body limit leaves headroom above the configured audio cap for the
/// multipart framing; the exact cap is enforced by command validation.
pub fn recordings_routes(max_upload_bytes: usize) -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_recordings).post(upload_recording))
        .route("/:id", delete(delete_recording))
        .layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024))
}

/// Upload a call recording
///
/// POST /recordings (multipart, field "audio")
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn upload_recording(
    State(state): State<FeatureState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Response, RecordingApiError> {
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RecordingApiError::Multipart(e.to_string()))?
    {
        if field.name() == Some("audio") {
            file_name = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| RecordingApiError::Multipart(e.to_string()))?;
            content = Some(data.to_vec());
        }
    }

    let content = content
        .ok_or_else(|| RecordingApiError::Multipart("missing 'audio' field".to_string()))?;

    let command = UploadRecordingCommand {
        user_id: user.id,
        file_name: file_name.unwrap_or_default(),
        content_type,
        content,
        max_bytes: state.max_upload_bytes,
    };

    let response = handle_upload(state.db.clone(), state.storage.clone(), command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// List the caller's recordings, newest first
///
/// GET /recordings
async fn list_recordings(
    State(state): State<FeatureState>,
    user: AuthUser,
) -> Result<Response, RecordingApiError> {
    let recordings = handle_list(state.db.clone(), ListRecordingsQuery { user_id: user.id })
        .await
        .map_err(RecordingApiError::Database)?;

    Ok((StatusCode::OK, Json(ApiResponse::success(recordings))).into_response())
}

/// Delete a recording, its jobs and its disk file
///
/// DELETE /recordings/:id
async fn delete_recording(
    State(state): State<FeatureState>,
    user: AuthUser,
    Path(recording_id): Path<Uuid>,
) -> Result<Response, RecordingApiError> {
    let command = DeleteRecordingCommand {
        recording_id,
        user_id: user.id,
    };

    handle_delete(state.db.clone(), state.storage.clone(), command).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({ "deleted": true }))),
    )
        .into_response())
}

#[derive(Debug)]
enum RecordingApiError {
    Upload(UploadRecordingError),
    Delete(DeleteRecordingError),
    Multipart(String),
    Database(sqlx::Error),
}

impl From<UploadRecordingError> for RecordingApiError {
    fn from(err: UploadRecordingError) -> Self {
        Self::Upload(err)
    }
}

impl From<DeleteRecordingError> for RecordingApiError {
    fn from(err: DeleteRecordingError) -> Self {
        Self::Delete(err)
    }
}

impl IntoResponse for RecordingApiError {
    fn into_response(self) -> Response {
        match self {
            RecordingApiError::Upload(UploadRecordingError::FilenameRequired)
            | RecordingApiError::Upload(UploadRecordingError::FilenameLength)
            | RecordingApiError::Upload(UploadRecordingError::ContentRequired)
            | RecordingApiError::Upload(UploadRecordingError::NotAudio) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            RecordingApiError::Upload(UploadRecordingError::TooLarge { .. }) => {
                let error = ErrorResponse::new("PAYLOAD_TOO_LARGE", self.to_string());
                (StatusCode::PAYLOAD_TOO_LARGE, Json(error)).into_response()
            },
            RecordingApiError::Multipart(ref message) => {
                let error = ErrorResponse::new("BAD_REQUEST", message.clone());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            RecordingApiError::Delete(DeleteRecordingError::NotFound) => {
                let error = ErrorResponse::new("NOT_FOUND", self.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            RecordingApiError::Upload(UploadRecordingError::Storage(_))
            | RecordingApiError::Upload(UploadRecordingError::Database(_))
            | RecordingApiError::Delete(DeleteRecordingError::Database(_))
            | RecordingApiError::Database(_) => {
                tracing::error!("Recording feature error: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for RecordingApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upload(e) => write!(f, "{}", e),
            Self::Delete(e) => write!(f, "{}", e),
            Self::Multipart(message) => write!(f, "Invalid multipart request: {}", message),
            Self::Database(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecordingApiError::Upload(UploadRecordingError::FilenameRequired);
        assert!(err.to_string().contains("Filename is required"));
    }

    #[test]
    fn test_routes_structure() {
        let router = recordings_routes(1024);
        assert!(format!("{:?}", router).contains("Router"));
    }
}
