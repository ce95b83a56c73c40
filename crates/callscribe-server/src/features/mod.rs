//! Feature modules implementing the callscribe API
//!
//! Each feature is a vertical slice following the CQRS layout:
//! `commands/` for write operations, `queries/` for reads, and a `routes.rs`
//! with the HTTP surface. Handlers are standalone async functions so they
//! can be exercised without the router.
//!
//! # Features
//!
//! - **auth**: registration, login and profile lookup (JWT bearer tokens)
//! - **recordings**: call audio upload, listing and deletion
//! - **jobs**: transcription job submission and status reconciliation

pub mod auth;
pub mod jobs;
pub mod recordings;
pub mod shared;

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::JwtAuth;
use crate::jobs::LifecycleManager;
use crate::storage::Storage;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool
    pub db: PgPool,
    /// Disk storage for uploaded recordings
    pub storage: Storage,
    /// Token service used by the auth extractor and the auth feature
    pub jwt: Arc<JwtAuth>,
    /// The transcription job lifecycle core
    pub lifecycle: Arc<LifecycleManager>,
    /// Upload size cap, applied as the request body limit
    pub max_upload_bytes: usize,
}

/// Creates the main API router with all feature routes mounted
///
/// - `/auth` - registration, login, profile
/// - `/recordings` - upload, list, delete
/// - `/jobs` - start transcription, query status
pub fn router(state: FeatureState) -> Router<()> {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .nest("/auth", auth::auth_routes().with_state(state.clone()))
        .nest(
            "/recordings",
            recordings::recordings_routes(max_upload_bytes).with_state(state.clone()),
        )
        .nest("/jobs", jobs::jobs_routes().with_state(state))
}
