//! Jobs feature: transcription submission and status queries
//!
//! Thin HTTP boundary over [`crate::jobs::LifecycleManager`]; all state
//! machine logic lives in the lifecycle core.

pub mod routes;

pub use routes::jobs_routes;
