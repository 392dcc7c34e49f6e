use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::application::services::{ModelAttemptStats, RateLimiterSnapshot};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ModelStatsResponse {
    pub models: Vec<ModelAttemptStats>,
    pub rate_limits: Vec<RateLimiterSnapshot>,
}

pub async fn model_stats_handler(State(state): State<AppState>) -> Json<ModelStatsResponse> {
    Json(ModelStatsResponse {
        models: state.model_stats.snapshot().await,
        rate_limits: state.rate_limiter.snapshot().await,
    })
}
