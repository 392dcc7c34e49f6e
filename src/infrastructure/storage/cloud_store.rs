use std::sync::Arc;
use std::time::Duration;

use object_store::ObjectStore;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as StorePath;
use object_store::signer::Signer;
use reqwest::Method;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

/// Azure Blob or Google Cloud Storage bucket handing out presigned URLs.
pub struct CloudStagingStore {
    inner: Arc<dyn ObjectStore>,
    signer: Arc<dyn Signer>,
    provider: &'static str,
}

impl CloudStagingStore {
    pub fn azure(account: &str, access_key: &str, container: &str) -> Result<Self, StagingStoreError> {
        let store = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_access_key(access_key)
            .with_container_name(container)
            .build()
            .map_err(|e| StagingStoreError::NotConfigured(e.to_string()))?;

        let store = Arc::new(store);
        Ok(Self {
            inner: store.clone(),
            signer: store,
            provider: "azure",
        })
    }

    pub fn gcs(bucket: &str, service_account_path: Option<&str>) -> Result<Self, StagingStoreError> {
        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket);
        if let Some(path) = service_account_path {
            builder = builder.with_service_account_path(path);
        }
        let store = builder
            .build()
            .map_err(|e| StagingStoreError::NotConfigured(e.to_string()))?;

        let store = Arc::new(store);
        Ok(Self {
            inner: store.clone(),
            signer: store,
            provider: "gcs",
        })
    }

    async fn sign(
        &self,
        method: Method,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<String, StagingStoreError> {
        let store_path = StorePath::from(path.as_str());
        let url = self
            .signer
            .signed_url(method, &store_path, ttl)
            .await
            .map_err(|e| StagingStoreError::SigningFailed(e.to_string()))?;
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl StagingStore for CloudStagingStore {
    #[tracing::instrument(skip(self), fields(provider = self.provider))]
    async fn issue_write_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<String, StagingStoreError> {
        self.sign(Method::PUT, path, ttl).await
    }

    #[tracing::instrument(skip(self), fields(provider = self.provider))]
    async fn issue_read_url(
        &self,
        path: &StoragePath,
        ttl: Duration,
    ) -> Result<Option<String>, StagingStoreError> {
        if !self.exists(path).await? {
            return Ok(None);
        }
        self.sign(Method::GET, path, ttl).await.map(Some)
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
