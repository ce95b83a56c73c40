//! Durable job records and the store contract
//!
//! The lifecycle manager only sees the [`JobStore`] and [`RecordingStore`]
//! traits; PostgreSQL implementations live here, and tests substitute an
//! in-memory store with the same compare-and-swap semantics.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::path::PathBuf;
use uuid::Uuid;

/// Job status as stored and as reported to clients
///
/// `pending` exists only inside the submission call and is never persisted
/// or externally visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "error" => Ok(JobStatus::Error),
            other => Err(anyhow::anyhow!("unknown job status '{}'", other)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted transcription job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recording_id: Uuid,
    pub provider_job_id: String,
    pub status: JobStatus,
    pub transcription: String,
    pub error: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields needed to persist a freshly submitted job
#[derive(Debug, Clone)]
pub struct NewJob {
    pub user_id: Uuid,
    pub recording_id: Uuid,
    pub provider_job_id: String,
}

/// Terminal result of a job as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(String),
    Failed(String),
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed(_) => JobStatus::Completed,
            JobOutcome::Failed(_) => JobStatus::Error,
        }
    }
}

/// Store contract for job records
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job in `processing` with its provider job id.
    async fn insert(&self, job: NewJob) -> Result<Job>;

    /// Ownership-scoped lookup; a foreign user's job is indistinguishable
    /// from an absent one.
    async fn find(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<Job>>;

    /// Apply a terminal outcome only if the job is still `processing`.
    ///
    /// Returns whether the write landed. A `false` return means another
    /// writer already applied a terminal state; callers must re-read rather
    /// than overwrite.
    async fn complete_if_processing(
        &self,
        job_id: Uuid,
        outcome: &JobOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// The lifecycle manager's narrow view of recordings
#[async_trait]
pub trait RecordingStore: Send + Sync {
    /// Ownership-scoped lookup of a recording and its on-disk location.
    async fn find_owned(&self, recording_id: Uuid, user_id: Uuid)
        -> Result<Option<RecordingRef>>;
}

/// What the lifecycle needs to know about a recording
#[derive(Debug, Clone)]
pub struct RecordingRef {
    pub id: Uuid,
    pub file_name: String,
    pub storage_path: PathBuf,
}

// ============================================================================
// PostgreSQL implementations
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    user_id: Uuid,
    recording_id: Uuid,
    provider_job_id: String,
    status: String,
    transcription: String,
    error: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = anyhow::Error;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Job {
            id: row.id,
            user_id: row.user_id,
            recording_id: row.recording_id,
            provider_job_id: row.provider_job_id,
            status: row.status.parse()?,
            transcription: row.transcription,
            error: row.error,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

/// Job store backed by the `transcription_jobs` table
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, job: NewJob) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO transcription_jobs (id, user_id, recording_id, provider_job_id, status)
            VALUES ($1, $2, $3, $4, 'processing')
            RETURNING id, user_id, recording_id, provider_job_id, status,
                      transcription, error, created_at, completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.user_id)
        .bind(job.recording_id)
        .bind(&job.provider_job_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, user_id, recording_id, provider_job_id, status,
                   transcription, error, created_at, completed_at
            FROM transcription_jobs
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn complete_if_processing(
        &self,
        job_id: Uuid,
        outcome: &JobOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let (status, transcription, error) = match outcome {
            JobOutcome::Completed(text) => (JobStatus::Completed, text.as_str(), ""),
            JobOutcome::Failed(detail) => (JobStatus::Error, "", detail.as_str()),
        };

        // The status guard is the compare-and-swap: a concurrent terminal
        // write makes this a no-op and rows_affected() reports the loss.
        let result = sqlx::query(
            r#"
            UPDATE transcription_jobs
            SET status = $2, transcription = $3, error = $4, completed_at = $5
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(transcription)
        .bind(error)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecordingRefRow {
    id: Uuid,
    file_name: String,
    storage_path: String,
}

/// Recording lookup backed by the `recordings` table
#[derive(Clone)]
pub struct PgRecordingStore {
    pool: PgPool,
}

impl PgRecordingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordingStore for PgRecordingStore {
    async fn find_owned(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RecordingRef>> {
        let row = sqlx::query_as::<_, RecordingRefRow>(
            r#"
            SELECT id, file_name, storage_path
            FROM recordings
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(recording_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| RecordingRef {
            id: r.id,
            file_name: r.file_name,
            storage_path: PathBuf::from(r.storage_path),
        }))
    }
}
