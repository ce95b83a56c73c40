//! Transcription job lifecycle
//!
//! A job is one attempt to transcribe a recording via the remote provider.
//! Its state machine is `processing -> {completed, error}`; terminal states
//! are absorbing. A job row exists only once the provider has acknowledged
//! the submission, so there is never a job pointing at a provider job that
//! was not actually created.
//!
//! Reconciliation is pull-based: the provider is polled only when a client
//! asks for status, and the single terminal write per job is enforced with a
//! compare-and-swap in the store rather than a cross-request lock.

pub mod lifecycle;
pub mod store;

pub use lifecycle::{JobView, LifecycleManager, ReconcileError, StartError};
pub use store::{Job, JobOutcome, JobStatus, JobStore, NewJob, RecordingRef, RecordingStore};
