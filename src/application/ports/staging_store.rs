use std::io;
use std::time::Duration;

use crate::domain::StoragePath;

/// Blob storage handing out short-lived direct-access locators.
#[async_trait::async_trait]
pub trait StagingStore: Send + Sync {
    async fn issue_write_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<String, StagingStoreError>;

    /// Returns `None` when nothing has been uploaded at `path`.
    async fn issue_read_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<Option<String>, StagingStoreError>;

    async fn exists(&self, path: &StoragePath) -> Result<bool, StagingStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StagingStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("url signing failed: {0}")]
    SigningFailed(String),
    #[error("store not configured: {0}")]
    NotConfigured(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
