//! Remote transcription provider
//!
//! The provider exposes a three-step submission handshake (acquire an upload
//! target, push the audio bytes, initiate the job) and a polling endpoint.
//! This module collapses that surface into two operations behind
//! [`TranscriptionProvider`] so the job lifecycle never sees transport
//! details.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod client;

pub use client::TorClient;

/// State the provider reports for a submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// Job accepted and still running
    Processing,
    /// Job finished; carries the transcript text
    Completed(String),
    /// The provider itself declared the job failed; permanent
    Failed(String),
}

/// Provider operation errors
///
/// `Unavailable` is always transient from the caller's perspective; the other
/// variants describe a failed submission handshake and are surfaced to the
/// client so it can retry the whole submission.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transcription provider unavailable: {0}")]
    Unavailable(String),

    #[error("audio upload failed: {0}")]
    UploadFailed(String),

    #[error("transcription request rejected: {0}")]
    SubmissionRejected(String),
}

/// Uniform contract for the remote transcription service
///
/// One submission attempt per `submit` call; retry policy belongs to the
/// caller. There is no rollback for the handshake: an upload target orphaned
/// by a later step failing is abandoned on the provider side.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Run the three-step handshake and return the provider's job identifier.
    async fn submit(&self, path: &Path, file_name: &str) -> Result<String, ProviderError>;

    /// Poll the provider for the current state of a job.
    async fn query_status(&self, provider_job_id: &str) -> Result<RemoteStatus, ProviderError>;
}
