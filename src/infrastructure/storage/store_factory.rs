use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::presentation::config::{StorageProviderSetting, StorageSettings};

use super::cloud_store::CloudStagingStore;
use super::local_store::LocalStagingStore;

/// The store used for signed URLs, plus the concrete local store when the upload
/// routes must serve it.
pub struct StagingStores {
    pub staging: Arc<dyn StagingStore>,
    pub local: Option<Arc<LocalStagingStore>>,
}

pub struct StagingStoreFactory;

impl StagingStoreFactory {
    pub fn create(
        settings: &StorageSettings,
        public_base_url: &str,
    ) -> Result<StagingStores, StagingStoreError> {
        match settings.provider {
            StorageProviderSetting::Local => {
                let path = PathBuf::from(&settings.local_path);
                let store = Arc::new(LocalStagingStore::new(path, public_base_url)?);
                Ok(StagingStores {
                    staging: store.clone(),
                    local: Some(store),
                })
            }
            StorageProviderSetting::Azure => {
                let account = required(&settings.azure_account, "azure_account")?;
                let key = required(&settings.azure_access_key, "azure_access_key")?;
                let container = required(&settings.azure_container, "azure_container")?;
                let store = CloudStagingStore::azure(account, key, container)?;
                Ok(StagingStores {
                    staging: Arc::new(store),
                    local: None,
                })
            }
            StorageProviderSetting::Gcs => {
                let bucket = required(&settings.gcs_bucket, "gcs_bucket")?;
                let store =
                    CloudStagingStore::gcs(bucket, settings.gcs_service_account_path.as_deref())?;
                Ok(StagingStores {
                    staging: Arc::new(store),
                    local: None,
                })
            }
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, StagingStoreError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StagingStoreError::NotConfigured(format!("{} required", name)))
}
