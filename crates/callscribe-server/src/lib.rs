//! Callscribe Server Library
//!
//! HTTP server for uploading call recordings and obtaining transcripts from a
//! remote transcription provider.
//!
//! # Overview
//!
//! - **API Endpoints**: REST API for auth, recordings and transcription jobs
//! - **Job Lifecycle**: pull-based reconciliation of long-running provider jobs
//! - **Database Management**: PostgreSQL integration with SQLx
//! - **Storage Backend**: local disk storage for uploaded audio
//! - **Configuration**: environment-based configuration management
//! - **Middleware**: CORS and request logging
//!
//! # Architecture
//!
//! Feature slices follow a CQRS layout: each feature under [`features`] has
//! `commands/` (write operations), `queries/` (read operations) and a
//! `routes.rs` mounting them under `/api/v1`.
//!
//! The transcription core is deliberately independent of the HTTP layer:
//!
//! - [`provider`] wraps the remote service's three-step submission handshake
//!   and its polling endpoint behind the `TranscriptionProvider` trait.
//! - [`jobs`] holds the job record store and the lifecycle manager that
//!   drives the `processing -> {completed, error}` state machine. Terminal
//!   writes go through a compare-and-swap so concurrent status queries for
//!   the same job cannot produce divergent terminal states.
//!
//! # Example
//!
//! ```no_run
//! use callscribe_server::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     println!("would bind {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod jobs;
pub mod middleware;
pub mod provider;
pub mod storage;

// Re-export commonly used types
pub use error::AppError;
