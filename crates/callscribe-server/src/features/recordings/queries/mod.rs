//! Recording queries (read operations)

pub mod list;

pub use list::{ListRecordingsQuery, RecordingSummary};
