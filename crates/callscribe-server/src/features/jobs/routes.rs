//! Job routes
//!
//! Reading a job's status is also what advances it: the GET handler runs the
//! lifecycle's reconcile step, so the cost of tracking provider progress is
//! paid only when a client actually asks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::features::FeatureState;
use crate::jobs::{JobStatus, JobView, ReconcileError, StartError};

/// Create job routes
pub fn jobs_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(start_job))
        .route("/:id", get(job_status))
}

#[derive(Debug, Deserialize)]
struct StartJobRequest {
    recording_id: Uuid,
}

#[derive(Debug, Serialize)]
struct StartJobResponse {
    job_id: Uuid,
    status: JobStatus,
}

/// Submit a recording for transcription
///
/// POST /jobs
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn start_job(
    State(state): State<FeatureState>,
    user: AuthUser,
    Json(request): Json<StartJobRequest>,
) -> Result<Response, JobApiError> {
    let job = state
        .lifecycle
        .start_transcription(request.recording_id, user.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(StartJobResponse {
            job_id: job.id,
            status: job.status,
        })),
    )
        .into_response())
}

/// Current status of a job, reconciling against the provider first
///
/// GET /jobs/:id
///
/// A transient provider failure still answers with the last known
/// (`processing`) status so a naive polling loop is never broken by a
/// single hiccup.
#[tracing::instrument(skip_all, fields(user_id = %user.id, job_id = %job_id))]
async fn job_status(
    State(state): State<FeatureState>,
    user: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Response, JobApiError> {
    let view = match state.lifecycle.reconcile(job_id, user.id).await {
        Ok(view) => view,
        Err(ReconcileError::TransientProvider(message)) => {
            tracing::warn!("Provider poll failed, reporting last known status: {}", message);
            JobView {
                status: JobStatus::Processing,
                transcription: None,
                error: None,
            }
        },
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::OK, Json(ApiResponse::success(view))).into_response())
}

#[derive(Debug)]
enum JobApiError {
    Start(StartError),
    Reconcile(ReconcileError),
}

impl From<StartError> for JobApiError {
    fn from(err: StartError) -> Self {
        Self::Start(err)
    }
}

impl From<ReconcileError> for JobApiError {
    fn from(err: ReconcileError) -> Self {
        Self::Reconcile(err)
    }
}

impl IntoResponse for JobApiError {
    fn into_response(self) -> Response {
        match self {
            JobApiError::Start(StartError::RecordingNotFound)
            | JobApiError::Reconcile(ReconcileError::JobNotFound) => {
                let error = ErrorResponse::new("NOT_FOUND", self.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            JobApiError::Start(StartError::FileMissing) => {
                let error = ErrorResponse::new("FILE_MISSING", self.to_string());
                (StatusCode::CONFLICT, Json(error)).into_response()
            },
            JobApiError::Start(StartError::Submission(_)) => {
                tracing::warn!("Provider submission failed: {}", self);
                let error = ErrorResponse::new("SUBMISSION_FAILED", self.to_string());
                (StatusCode::BAD_GATEWAY, Json(error)).into_response()
            },
            JobApiError::Start(StartError::Store(_))
            | JobApiError::Reconcile(ReconcileError::Store(_)) => {
                tracing::error!("Job feature error: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            // Translated to a processing view in the handler; kept for
            // completeness should a future route propagate it.
            JobApiError::Reconcile(ReconcileError::TransientProvider(_)) => {
                let error = ErrorResponse::new("PROVIDER_UNAVAILABLE", self.to_string());
                (StatusCode::SERVICE_UNAVAILABLE, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for JobApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start(e) => write!(f, "{}", e),
            Self::Reconcile(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JobApiError::Start(StartError::FileMissing);
        assert!(err.to_string().contains("no longer available"));
    }

    #[test]
    fn test_routes_structure() {
        let router = jobs_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
