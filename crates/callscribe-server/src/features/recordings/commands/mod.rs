//! Recording commands (write operations)

pub mod delete;
pub mod upload;

pub use delete::{DeleteRecordingCommand, DeleteRecordingError};
pub use upload::{UploadRecordingCommand, UploadRecordingError, UploadRecordingResponse};
