use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::AiProvider;

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    rate_limited: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAttemptStats {
    pub provider: AiProvider,
    pub model: String,
    pub attempts: u64,
    pub successes: u64,
    pub rate_limited: u64,
}

/// Process-wide per-(provider, model) counters. Observability only.
#[derive(Debug, Default)]
pub struct ModelStatsRegistry {
    counters: RwLock<HashMap<(AiProvider, String), Arc<Counters>>>,
}

impl ModelStatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_attempt(&self, provider: AiProvider, model: &str) {
        self.counters(provider, model)
            .await
            .attempts
            .fetch_add(1, Ordering::Relaxed);
    }

    pub async fn record_success(&self, provider: AiProvider, model: &str) {
        self.counters(provider, model)
            .await
            .successes
            .fetch_add(1, Ordering::Relaxed);
    }

    pub async fn record_rate_limited(&self, provider: AiProvider, model: &str) {
        self.counters(provider, model)
            .await
            .rate_limited
            .fetch_add(1, Ordering::Relaxed);
    }

    pub async fn get(&self, provider: AiProvider, model: &str) -> Option<ModelAttemptStats> {
        let counters = self.counters.read().await;
        counters
            .get(&(provider, model.to_string()))
            .map(|c| to_stats(provider, model, c))
    }

    pub async fn snapshot(&self) -> Vec<ModelAttemptStats> {
        let counters = self.counters.read().await;
        let mut stats: Vec<ModelAttemptStats> = counters
            .iter()
            .map(|((provider, model), c)| to_stats(*provider, model, c))
            .collect();
        stats.sort_by(|a, b| {
            (a.provider.as_str(), a.model.as_str()).cmp(&(b.provider.as_str(), b.model.as_str()))
        });
        stats
    }

    async fn counters(&self, provider: AiProvider, model: &str) -> Arc<Counters> {
        let key = (provider, model.to_string());
        if let Some(c) = self.counters.read().await.get(&key) {
            return Arc::clone(c);
        }
        Arc::clone(self.counters.write().await.entry(key).or_default())
    }
}

fn to_stats(provider: AiProvider, model: &str, counters: &Counters) -> ModelAttemptStats {
    ModelAttemptStats {
        provider,
        model: model.to_string(),
        attempts: counters.attempts.load(Ordering::Relaxed),
        successes: counters.successes.load(Ordering::Relaxed),
        rate_limited: counters.rate_limited.load(Ordering::Relaxed),
    }
}
