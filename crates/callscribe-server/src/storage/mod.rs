//! Local disk storage for uploaded recordings
//!
//! Uploaded audio lives in a single configured directory; files are named by
//! a fresh UUID plus the original extension so user-supplied names never
//! touch the filesystem.

use std::path::{Path, PathBuf};

use callscribe_common::CallscribeError;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::UploadConfig;

/// Outcome of storing an uploaded file
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: i64,
}

/// Disk-backed storage rooted at the configured upload directory
#[derive(Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub async fn new(config: &UploadConfig) -> Result<Self, CallscribeError> {
        tokio::fs::create_dir_all(&config.dir).await.map_err(|e| {
            CallscribeError::Storage(format!(
                "failed to create upload directory '{}': {}",
                config.dir.display(),
                e
            ))
        })?;

        let root = config.dir.canonicalize().map_err(|e| {
            CallscribeError::Storage(format!(
                "failed to resolve upload directory '{}': {}",
                config.dir.display(),
                e
            ))
        })?;

        info!("Upload storage initialized at {}", root.display());

        Ok(Self { root })
    }

    /// Write uploaded bytes under a generated name, keeping the original
    /// extension for provider content-type sniffing.
    #[instrument(skip(self, data), fields(original = %original_name))]
    pub async fn store(&self, original_name: &str, data: &[u8]) -> Result<StoredFile, CallscribeError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.root.join(file_name);

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| CallscribeError::Storage(format!("failed to write upload: {}", e)))?;

        debug!("Stored {} bytes at {}", data.len(), path.display());

        Ok(StoredFile {
            path,
            size: data.len() as i64,
        })
    }

    /// Whether the backing file for a recording is still present.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Remove a stored file. Missing files are not an error; the recording
    /// row is authoritative and the file may already be gone.
    #[instrument(skip(self))]
    pub async fn remove(&self, path: &Path) -> Result<(), CallscribeError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("File already absent: {}", path.display());
                Ok(())
            },
            Err(e) => Err(CallscribeError::Storage(format!(
                "failed to remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Root directory for stored uploads
    pub fn root(&self) -> &Path {
        &self.root
    }
}
