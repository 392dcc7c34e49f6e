use std::sync::Arc;

use crate::application::services::{BatchOrchestrator, ModelStatsRegistry, RateLimiter};
use crate::infrastructure::storage::LocalStagingStore;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub model_stats: Arc<ModelStatsRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Present only when uploads are staged on local disk and served by this process.
    pub local_store: Option<Arc<LocalStagingStore>>,
}
