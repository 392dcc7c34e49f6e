use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use futures::stream::BoxStream;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{MultipartUpload, ObjectStore, PutPayload};
use reqwest::Url;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

pub const UPLOAD_ROUTE_PREFIX: &str = "/api/v1/uploads";

/// Directory-backed store for local runs and tests.
///
/// Issued URLs point back at this service's own upload route with an `expires` unix
/// timestamp; the route handlers call [`store`](Self::store) and [`fetch`](Self::fetch).
pub struct LocalStagingStore {
    inner: Arc<LocalFileSystem>,
    public_base_url: Url,
}

impl LocalStagingStore {
    pub fn new(base_path: PathBuf, public_base_url: &str) -> Result<Self, StagingStoreError> {
        std::fs::create_dir_all(&base_path).map_err(StagingStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| StagingStoreError::NotConfigured(e.to_string()))?;
        let public_base_url = Url::parse(public_base_url).map_err(|e| {
            StagingStoreError::NotConfigured(format!("invalid public base url: {}", e))
        })?;
        Ok(Self {
            inner: Arc::new(fs),
            public_base_url,
        })
    }

    pub fn is_expired(expires_at: i64) -> bool {
        Utc::now().timestamp() > expires_at
    }

    /// Each path segment is percent-encoded, so filenames with `#`, `?` or `%` still
    /// address the stored object.
    fn url_for(&self, path: &StoragePath, ttl: Duration) -> Result<String, StagingStoreError> {
        let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;
        let mut url = self.public_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StagingStoreError::NotConfigured("public base url cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .extend(UPLOAD_ROUTE_PREFIX.trim_start_matches('/').split('/'))
            .extend(path.as_str().split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires_at.to_string());
        Ok(url.into())
    }

    pub async fn store(
        &self,
        path: &StoragePath,
        mut stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<u64, StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        let mut upload = self
            .inner
            .put_multipart(&store_path)
            .await
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;

        let mut total_bytes: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    let _ = upload.abort().await;
                    return Err(StagingStoreError::Io(e));
                }
            };
            total_bytes += bytes.len() as u64;
            if let Err(e) = upload.put_part(PutPayload::from(bytes)).await {
                let _ = upload.abort().await;
                return Err(StagingStoreError::UploadFailed(e.to_string()));
            }
        }

        upload
            .complete()
            .await
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;

        tracing::debug!(path = %path, bytes = total_bytes, "Stored upload");
        Ok(total_bytes)
    }

    pub async fn fetch(&self, path: &StoragePath) -> Result<Bytes, StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        let result = self.inner.get(&store_path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => StagingStoreError::NotFound(path.to_string()),
            other => StagingStoreError::DownloadFailed(other.to_string()),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| StagingStoreError::DownloadFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl StagingStore for LocalStagingStore {
    async fn issue_write_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<String, StagingStoreError> {
        self.url_for(path, ttl)
    }

    async fn issue_read_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<Option<String>, StagingStoreError> {
        if !self.exists(path).await? {
            return Ok(None);
        }
        self.url_for(path, ttl).map(Some)
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool, StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        match self.inner.head(&store_path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StagingStoreError::DownloadFailed(e.to_string())),
        }
    }
}
