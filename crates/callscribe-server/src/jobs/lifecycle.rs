//! The job lifecycle manager
//!
//! Orchestrates submission and pull-based reconciliation. Submission is a
//! create-on-success operation: a provider failure leaves no local state, so
//! a client retry simply produces a brand-new job. Reconciliation advances a
//! `processing` job from whatever the provider currently reports, guarding
//! the terminal write with the store's compare-and-swap so concurrent status
//! queries for the same job converge on a single terminal record.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::store::{Job, JobOutcome, JobStatus, JobStore, NewJob, RecordingStore};
use crate::provider::{ProviderError, RemoteStatus, TranscriptionProvider};

/// Read-only projection of a job returned to status-query callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            status: job.status,
            transcription: (!job.transcription.is_empty()).then(|| job.transcription.clone()),
            error: (!job.error.is_empty()).then(|| job.error.clone()),
        }
    }
}

impl From<&JobOutcome> for JobView {
    fn from(outcome: &JobOutcome) -> Self {
        match outcome {
            JobOutcome::Completed(text) => Self {
                status: JobStatus::Completed,
                transcription: Some(text.clone()),
                error: None,
            },
            JobOutcome::Failed(detail) => Self {
                status: JobStatus::Error,
                transcription: None,
                error: Some(detail.clone()),
            },
        }
    }
}

/// Errors from starting a transcription
#[derive(Debug, Error)]
pub enum StartError {
    #[error("Recording not found")]
    RecordingNotFound,

    #[error("Recording file is no longer available on disk")]
    FileMissing,

    #[error("Submission failed: {0}")]
    Submission(ProviderError),

    #[error("Job storage failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// Errors from reconciling a job
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Job not found")]
    JobNotFound,

    #[error("Transient provider error: {0}")]
    TransientProvider(String),

    #[error("Job storage failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// Drives the job state machine against the provider and the record store
pub struct LifecycleManager {
    recordings: Arc<dyn RecordingStore>,
    jobs: Arc<dyn JobStore>,
    provider: Arc<dyn TranscriptionProvider>,
}

impl LifecycleManager {
    pub fn new(
        recordings: Arc<dyn RecordingStore>,
        jobs: Arc<dyn JobStore>,
        provider: Arc<dyn TranscriptionProvider>,
    ) -> Self {
        Self {
            recordings,
            jobs,
            provider,
        }
    }

    /// Submit a recording to the provider and persist the resulting job.
    ///
    /// The job row is written only after the provider has acknowledged the
    /// submission; any earlier failure leaves the store untouched.
    #[instrument(skip(self))]
    pub async fn start_transcription(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
    ) -> Result<Job, StartError> {
        let recording = self
            .recordings
            .find_owned(recording_id, user_id)
            .await?
            .ok_or(StartError::RecordingNotFound)?;

        if !tokio::fs::try_exists(&recording.storage_path)
            .await
            .unwrap_or(false)
        {
            warn!(
                recording_id = %recording.id,
                path = %recording.storage_path.display(),
                "Recording file missing at submission time"
            );
            return Err(StartError::FileMissing);
        }

        let provider_job_id = self
            .provider
            .submit(&recording.storage_path, &recording.file_name)
            .await
            .map_err(StartError::Submission)?;

        let job = self
            .jobs
            .insert(NewJob {
                user_id,
                recording_id,
                provider_job_id,
            })
            .await?;

        info!(job_id = %job.id, provider_job_id = %job.provider_job_id, "Transcription started");

        Ok(job)
    }

    /// Read-and-advance: return the job's current view, polling the provider
    /// first when the job is still in flight.
    ///
    /// Terminal jobs are returned from the store without a provider call. A
    /// provider hiccup while polling surfaces as `TransientProvider` and
    /// never touches the stored record.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, job_id: Uuid, user_id: Uuid) -> Result<JobView, ReconcileError> {
        let job = self
            .jobs
            .find(job_id, user_id)
            .await?
            .ok_or(ReconcileError::JobNotFound)?;

        if job.status.is_terminal() {
            return Ok(JobView::from(&job));
        }

        let remote = self
            .provider
            .query_status(&job.provider_job_id)
            .await
            .map_err(|e| match e {
                ProviderError::Unavailable(msg) => ReconcileError::TransientProvider(msg),
                other => ReconcileError::TransientProvider(other.to_string()),
            })?;

        let outcome = match remote {
            RemoteStatus::Processing => {
                debug!(job_id = %job.id, "Provider still processing");
                return Ok(JobView::from(&job));
            },
            RemoteStatus::Completed(text) => JobOutcome::Completed(text),
            RemoteStatus::Failed(detail) => JobOutcome::Failed(detail),
        };

        let applied = self
            .jobs
            .complete_if_processing(job.id, &outcome, Utc::now())
            .await?;

        if applied {
            info!(job_id = %job.id, status = %outcome.status(), "Job reached terminal state");
            Ok(JobView::from(&outcome))
        } else {
            // Lost the race against a concurrent reconciler; its terminal
            // write is authoritative, so discard ours and re-read.
            debug!(job_id = %job.id, "Terminal write already applied elsewhere");
            let job = self
                .jobs
                .find(job_id, user_id)
                .await?
                .ok_or(ReconcileError::JobNotFound)?;
            Ok(JobView::from(&job))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job_with(status: JobStatus, transcription: &str, error: &str) -> Job {
        Job {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            recording_id: Uuid::new_v4(),
            provider_job_id: "order-1".to_string(),
            status,
            transcription: transcription.to_string(),
            error: error.to_string(),
            created_at: Utc::now(),
            completed_at: status.is_terminal().then(Utc::now),
        }
    }

    #[test]
    fn test_view_of_processing_job() {
        let view = JobView::from(&job_with(JobStatus::Processing, "", ""));
        assert_eq!(view.status, JobStatus::Processing);
        assert_eq!(view.transcription, None);
        assert_eq!(view.error, None);
    }

    #[test]
    fn test_view_of_completed_job() {
        let view = JobView::from(&job_with(JobStatus::Completed, "hello world", ""));
        assert_eq!(view.status, JobStatus::Completed);
        assert_eq!(view.transcription.as_deref(), Some("hello world"));
        assert_eq!(view.error, None);
    }

    #[test]
    fn test_view_of_failed_job() {
        let view = JobView::from(&job_with(JobStatus::Error, "", "audio unreadable"));
        assert_eq!(view.status, JobStatus::Error);
        assert_eq!(view.transcription, None);
        assert_eq!(view.error.as_deref(), Some("audio unreadable"));
    }

    #[test]
    fn test_view_of_outcome_matches_view_of_job() {
        let outcome = JobOutcome::Completed("hello world".to_string());
        let from_outcome = JobView::from(&outcome);
        let from_job = JobView::from(&job_with(JobStatus::Completed, "hello world", ""));
        assert_eq!(from_outcome, from_job);
    }
}
