use std::sync::Arc;

use crate::application::ports::{TranscriptionError, TranscriptionProvider};
use crate::presentation::config::{TranscriptionProviderSetting, TranscriptionSettings};

use super::daglo_client::DagloClient;

pub struct TranscriptionProviderFactory;

impl TranscriptionProviderFactory {
    pub fn create(
        settings: &TranscriptionSettings,
    ) -> Result<Arc<dyn TranscriptionProvider>, TranscriptionError> {
        match settings.provider {
            TranscriptionProviderSetting::Daglo => {
                let key = settings
                    .api_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        TranscriptionError::NotConfigured("API key required for Daglo".to_string())
                    })?;
                Ok(Arc::new(DagloClient::new(key, settings.base_url.clone())))
            }
        }
    }
}
