//! Callscribe Common Library
//!
//! Shared error handling and logging for the callscribe workspace.
//!
//! # Overview
//!
//! This crate provides functionality used across all workspace members:
//!
//! - **Error Handling**: the [`CallscribeError`] type and [`Result`] alias
//! - **Logging**: tracing-based logging with env-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use callscribe_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CallscribeError, Result};
