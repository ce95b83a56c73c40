//! Lifecycle manager tests
//!
//! The manager only sees the store traits and the provider trait, so these
//! tests drive it with an in-memory store that keeps the compare-and-swap
//! semantics of the PostgreSQL implementation, and a provider whose behavior
//! is scripted per test.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use uuid::Uuid;

use callscribe_server::jobs::{
    Job, JobOutcome, JobStatus, JobStore, JobView, LifecycleManager, NewJob, ReconcileError,
    RecordingRef, RecordingStore, StartError,
};
use callscribe_server::provider::{ProviderError, RemoteStatus, TranscriptionProvider};

// ============================================================================
// In-memory stores
// ============================================================================

#[derive(Default)]
struct MemoryRecordingStore {
    entries: Mutex<Vec<(Uuid, RecordingRef)>>,
}

impl MemoryRecordingStore {
    fn add(&self, user_id: Uuid, recording: RecordingRef) {
        self.entries.lock().unwrap().push((user_id, recording));
    }
}

#[async_trait]
impl RecordingStore for MemoryRecordingStore {
    async fn find_owned(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RecordingRef>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|(owner, r)| *owner == user_id && r.id == recording_id)
            .map(|(_, r)| r.clone()))
    }
}

#[derive(Default)]
struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
    terminal_writes: AtomicUsize,
}

impl MemoryJobStore {
    fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: NewJob) -> Result<Job> {
        let job = Job {
            id: Uuid::new_v4(),
            user_id: job.user_id,
            recording_id: job.recording_id,
            provider_job_id: job.provider_job_id,
            status: JobStatus::Processing,
            transcription: String::new(),
            error: String::new(),
            created_at: Utc::now(),
            completed_at: None,
        };
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(job)
    }

    async fn find(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<Job>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(&job_id)
            .filter(|job| job.user_id == user_id)
            .cloned())
    }

    async fn complete_if_processing(
        &self,
        job_id: Uuid,
        outcome: &JobOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&job_id) else {
            return Ok(false);
        };
        if job.status != JobStatus::Processing {
            return Ok(false);
        }
        match outcome {
            JobOutcome::Completed(text) => {
                job.status = JobStatus::Completed;
                job.transcription = text.clone();
            },
            JobOutcome::Failed(detail) => {
                job.status = JobStatus::Error;
                job.error = detail.clone();
            },
        }
        job.completed_at = Some(completed_at);
        self.terminal_writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

// ============================================================================
// Scripted provider
// ============================================================================

enum SubmitScript {
    Accept(String),
    Unavailable,
    Rejected,
}

enum StatusScript {
    Processing,
    Completed(String),
    Failed(String),
    Unavailable,
}

struct ScriptedProvider {
    submit: SubmitScript,
    status: StatusScript,
    status_calls: AtomicUsize,
    /// When set, query_status blocks until this many callers are in flight,
    /// guaranteeing a genuine race on the terminal write.
    rendezvous: Option<Arc<tokio::sync::Barrier>>,
}

impl ScriptedProvider {
    fn new(submit: SubmitScript, status: StatusScript) -> Self {
        Self {
            submit,
            status,
            status_calls: AtomicUsize::new(0),
            rendezvous: None,
        }
    }

    fn with_rendezvous(mut self, barrier: Arc<tokio::sync::Barrier>) -> Self {
        self.rendezvous = Some(barrier);
        self
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionProvider for ScriptedProvider {
    async fn submit(&self, _path: &Path, _file_name: &str) -> Result<String, ProviderError> {
        match &self.submit {
            SubmitScript::Accept(order_id) => Ok(order_id.clone()),
            SubmitScript::Unavailable => Err(ProviderError::Unavailable(
                "provider is down".to_string(),
            )),
            SubmitScript::Rejected => Err(ProviderError::SubmissionRejected(
                "bad configuration".to_string(),
            )),
        }
    }

    async fn query_status(&self, _provider_job_id: &str) -> Result<RemoteStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
        match &self.status {
            StatusScript::Processing => Ok(RemoteStatus::Processing),
            StatusScript::Completed(text) => Ok(RemoteStatus::Completed(text.clone())),
            StatusScript::Failed(detail) => Ok(RemoteStatus::Failed(detail.clone())),
            StatusScript::Unavailable => {
                Err(ProviderError::Unavailable("poll timed out".to_string()))
            },
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    recordings: Arc<MemoryRecordingStore>,
    jobs: Arc<MemoryJobStore>,
    provider: Arc<ScriptedProvider>,
    manager: Arc<LifecycleManager>,
    // Keeps the backing audio file alive for the duration of the test
    _audio: NamedTempFile,
    user_id: Uuid,
    recording_id: Uuid,
}

fn harness(provider: ScriptedProvider) -> Harness {
    let mut audio = NamedTempFile::new().unwrap();
    audio.write_all(b"fake audio").unwrap();

    let recordings = Arc::new(MemoryRecordingStore::default());
    let jobs = Arc::new(MemoryJobStore::default());
    let provider = Arc::new(provider);

    let user_id = Uuid::new_v4();
    let recording_id = Uuid::new_v4();
    recordings.add(
        user_id,
        RecordingRef {
            id: recording_id,
            file_name: "call.mp3".to_string(),
            storage_path: audio.path().to_path_buf(),
        },
    );

    let manager = Arc::new(LifecycleManager::new(
        recordings.clone(),
        jobs.clone(),
        provider.clone(),
    ));

    Harness {
        recordings,
        jobs,
        provider,
        manager,
        _audio: audio,
        user_id,
        recording_id,
    }
}

// ============================================================================
// start_transcription
// ============================================================================

#[tokio::test]
async fn start_creates_processing_job_on_success() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Processing,
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.provider_job_id, "order-77");
    assert_eq!(job.recording_id, h.recording_id);
    assert!(job.completed_at.is_none());
    assert_eq!(h.jobs.len(), 1);
}

#[tokio::test]
async fn start_fails_for_unknown_recording() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Processing,
    ));

    let err = h
        .manager
        .start_transcription(Uuid::new_v4(), h.user_id)
        .await
        .unwrap_err();

    assert!(matches!(err, StartError::RecordingNotFound));
    assert_eq!(h.jobs.len(), 0);
}

#[tokio::test]
async fn start_fails_for_foreign_recording() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Processing,
    ));

    let err = h
        .manager
        .start_transcription(h.recording_id, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, StartError::RecordingNotFound));
}

#[tokio::test]
async fn start_fails_when_file_is_gone_and_leaves_store_unchanged() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Processing,
    ));

    let orphan_id = Uuid::new_v4();
    h.recordings.add(
        h.user_id,
        RecordingRef {
            id: orphan_id,
            file_name: "gone.mp3".to_string(),
            storage_path: std::env::temp_dir().join("does-not-exist-anymore.mp3"),
        },
    );

    let err = h
        .manager
        .start_transcription(orphan_id, h.user_id)
        .await
        .unwrap_err();

    assert!(matches!(err, StartError::FileMissing));
    assert_eq!(h.jobs.len(), 0);
}

#[tokio::test]
async fn start_persists_nothing_when_submission_fails() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Rejected,
        StatusScript::Processing,
    ));

    let err = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StartError::Submission(ProviderError::SubmissionRejected(_))
    ));
    assert_eq!(h.jobs.len(), 0);
}

#[tokio::test]
async fn start_after_failure_creates_a_fresh_job() {
    let failing = harness(ScriptedProvider::new(
        SubmitScript::Unavailable,
        StatusScript::Processing,
    ));
    assert!(failing
        .manager
        .start_transcription(failing.recording_id, failing.user_id)
        .await
        .is_err());
    assert_eq!(failing.jobs.len(), 0);

    // The retry path is a brand-new submission with no inherited state
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-2".to_string()),
        StatusScript::Processing,
    ));
    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();
    assert_eq!(job.provider_job_id, "order-2");
}

// ============================================================================
// reconcile
// ============================================================================

#[tokio::test]
async fn reconcile_unknown_job_is_not_found() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Processing,
    ));

    let err = h
        .manager
        .reconcile(Uuid::new_v4(), h.user_id)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::JobNotFound));
}

#[tokio::test]
async fn reconcile_foreign_job_is_not_found() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Completed("hello world".to_string()),
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();

    let err = h.manager.reconcile(job.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::JobNotFound));
    // Ownership is checked before any provider traffic
    assert_eq!(h.provider.status_calls(), 0);
}

#[tokio::test]
async fn reconcile_keeps_processing_job_untouched() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Processing,
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();

    let view = h.manager.reconcile(job.id, h.user_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Processing);
    assert_eq!(view.transcription, None);
    assert_eq!(view.error, None);

    let stored = h.jobs.get(job.id).unwrap();
    assert_eq!(stored.status, JobStatus::Processing);
    assert!(stored.completed_at.is_none());
}

#[tokio::test]
async fn reconcile_applies_completion_exactly_once() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Completed("hello world".to_string()),
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();

    let view = h.manager.reconcile(job.id, h.user_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.transcription.as_deref(), Some("hello world"));
    assert_eq!(view.error, None);

    let stored = h.jobs.get(job.id).unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.transcription, "hello world");
    assert_eq!(stored.error, "");
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn reconcile_records_provider_reported_failure() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Failed("audio is unreadable".to_string()),
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();

    let view = h.manager.reconcile(job.id, h.user_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Error);
    assert_eq!(view.error.as_deref(), Some("audio is unreadable"));
    assert_eq!(view.transcription, None);

    let stored = h.jobs.get(job.id).unwrap();
    assert_eq!(stored.status, JobStatus::Error);
    assert_eq!(stored.error, "audio is unreadable");
    assert_eq!(stored.transcription, "");
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn reconcile_after_terminal_skips_the_provider() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Completed("hello world".to_string()),
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();

    let first = h.manager.reconcile(job.id, h.user_id).await.unwrap();
    assert_eq!(h.provider.status_calls(), 1);

    let second = h.manager.reconcile(job.id, h.user_id).await.unwrap();
    let third = h.manager.reconcile(job.id, h.user_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    // Terminal fast path: no further provider traffic
    assert_eq!(h.provider.status_calls(), 1);
}

#[tokio::test]
async fn reconcile_transient_failure_changes_nothing() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Unavailable,
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();
    let before = h.jobs.get(job.id).unwrap();

    let err = h.manager.reconcile(job.id, h.user_id).await.unwrap_err();
    assert!(matches!(err, ReconcileError::TransientProvider(_)));

    let after = h.jobs.get(job.id).unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.transcription, before.transcription);
    assert_eq!(after.error, before.error);
    assert!(after.completed_at.is_none());
}

#[tokio::test]
async fn concurrent_reconciles_produce_one_terminal_write() {
    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let h = harness(
        ScriptedProvider::new(
            SubmitScript::Accept("order-77".to_string()),
            StatusScript::Completed("hello world".to_string()),
        )
        .with_rendezvous(barrier),
    );

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();

    // Both tasks observe the job as processing, poll the provider at the
    // same moment, and race on the terminal write.
    let first = tokio::spawn({
        let manager = h.manager.clone();
        let user_id = h.user_id;
        let job_id = job.id;
        async move { manager.reconcile(job_id, user_id).await }
    });
    let second = tokio::spawn({
        let manager = h.manager.clone();
        let user_id = h.user_id;
        let job_id = job.id;
        async move { manager.reconcile(job_id, user_id).await }
    });

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    let expected = JobView {
        status: JobStatus::Completed,
        transcription: Some("hello world".to_string()),
        error: None,
    };
    assert_eq!(first, expected);
    assert_eq!(second, expected);

    assert_eq!(h.jobs.terminal_writes.load(Ordering::SeqCst), 1);
    assert_eq!(h.jobs.get(job.id).unwrap().transcription, "hello world");
}

#[tokio::test]
async fn full_scenario_upload_to_repeated_status() {
    let h = harness(ScriptedProvider::new(
        SubmitScript::Accept("order-77".to_string()),
        StatusScript::Completed("hello world".to_string()),
    ));

    let job = h
        .manager
        .start_transcription(h.recording_id, h.user_id)
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Processing);

    let view = h.manager.reconcile(job.id, h.user_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.transcription.as_deref(), Some("hello world"));

    let again = h.manager.reconcile(job.id, h.user_id).await.unwrap();
    assert_eq!(view, again);
    assert_eq!(h.provider.status_calls(), 1);
}
