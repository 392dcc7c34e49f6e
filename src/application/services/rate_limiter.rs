use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedSemaphorePermit, RwLock, Semaphore};
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(60);
const WINDOW_SLACK: Duration = Duration::from_secs(1);
const BUDGET_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelLimits {
    pub max_concurrent: usize,
    /// Zero disables request-cadence throttling.
    pub requests_per_minute: u32,
    pub tokens_per_minute: u32,
}

impl ModelLimits {
    pub fn new(max_concurrent: usize, requests_per_minute: u32, tokens_per_minute: u32) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            requests_per_minute,
            tokens_per_minute,
        }
    }

    fn request_budget(&self) -> Option<usize> {
        if self.requests_per_minute == 0 {
            return None;
        }
        let budget = (self.requests_per_minute as f64 * BUDGET_RATIO).ceil() as usize;
        Some(budget.max(1))
    }

    fn token_threshold(&self) -> Option<usize> {
        if self.tokens_per_minute == 0 {
            return None;
        }
        Some((self.tokens_per_minute as f64 * BUDGET_RATIO) as usize)
    }
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self::new(1, 500, 30_000)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimiterError {
    #[error("rate limiter closed for model {0}")]
    Closed(String),
}

/// Surfaced when a single call is expected to consume most of a model's per-minute
/// token budget. Calls are never held back on this basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudgetWarning {
    pub estimated_tokens: usize,
    pub threshold: usize,
}

/// Holds one concurrency slot for a model until dropped.
#[derive(Debug)]
pub struct RatePermit {
    model: String,
    token_warning: Option<TokenBudgetWarning>,
    _slot: OwnedSemaphorePermit,
}

impl RatePermit {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn token_warning(&self) -> Option<TokenBudgetWarning> {
        self.token_warning
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterSnapshot {
    pub model: String,
    pub max_concurrent: usize,
    pub available_slots: usize,
    pub recent_requests: usize,
    pub requests_per_minute: u32,
    pub tokens_per_minute: u32,
}

struct ModelGate {
    limits: ModelLimits,
    slots: Arc<Semaphore>,
    recent_requests: Mutex<VecDeque<Instant>>,
}

impl ModelGate {
    fn new(limits: ModelLimits) -> Self {
        Self {
            limits,
            slots: Arc::new(Semaphore::new(limits.max_concurrent)),
            recent_requests: Mutex::new(VecDeque::new()),
        }
    }

    /// Records a request in the window, or returns how long to wait before re-checking.
    async fn try_admit(&self) -> Result<(), Duration> {
        let Some(budget) = self.limits.request_budget() else {
            return Ok(());
        };

        let now = Instant::now();
        let mut timestamps = self.recent_requests.lock().await;
        prune(&mut timestamps, now);

        if timestamps.len() < budget {
            timestamps.push_back(now);
            return Ok(());
        }

        // Non-empty here: budget is at least one.
        let oldest = timestamps.front().copied().unwrap_or(now);
        let age = now.saturating_duration_since(oldest);
        Err(WINDOW.saturating_sub(age) + WINDOW_SLACK)
    }

    async fn recent_count(&self) -> usize {
        let mut timestamps = self.recent_requests.lock().await;
        prune(&mut timestamps, Instant::now());
        timestamps.len()
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&timestamp) = timestamps.front() {
        if now.saturating_duration_since(timestamp) >= WINDOW {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Per-model concurrency cap plus a trailing 60-second request window.
///
/// Shared by every job in the process. Models without registered limits get the
/// limiter's default limits on first use.
pub struct RateLimiter {
    gates: RwLock<HashMap<String, Arc<ModelGate>>>,
    default_limits: ModelLimits,
}

impl RateLimiter {
    pub fn new(default_limits: ModelLimits) -> Self {
        Self {
            gates: RwLock::new(HashMap::new()),
            default_limits,
        }
    }

    pub fn with_models(
        default_limits: ModelLimits,
        models: impl IntoIterator<Item = (String, ModelLimits)>,
    ) -> Self {
        let gates = models
            .into_iter()
            .map(|(model, limits)| (model, Arc::new(ModelGate::new(limits))))
            .collect();
        Self {
            gates: RwLock::new(gates),
            default_limits,
        }
    }

    /// Registers or replaces the limits for `model`. Permits already handed out keep
    /// counting against the previous gate.
    pub async fn add_model(&self, model: impl Into<String>, limits: ModelLimits) {
        self.gates
            .write()
            .await
            .insert(model.into(), Arc::new(ModelGate::new(limits)));
    }

    /// Waits for a free slot, then for room in the request window.
    ///
    /// The slot is released when the returned permit is dropped, including when the
    /// awaiting future is cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn acquire(
        &self,
        model: &str,
        estimated_tokens: usize,
    ) -> Result<RatePermit, RateLimiterError> {
        let gate = self.gate(model).await;

        let slot = Arc::clone(&gate.slots)
            .acquire_owned()
            .await
            .map_err(|_| RateLimiterError::Closed(model.to_string()))?;

        while let Err(wait) = gate.try_admit().await {
            tracing::info!(
                wait_secs = wait.as_secs_f64(),
                requests_per_minute = gate.limits.requests_per_minute,
                "Request window near limit, waiting"
            );
            tokio::time::sleep(wait).await;
        }

        let token_warning = gate
            .limits
            .token_threshold()
            .filter(|threshold| estimated_tokens > *threshold)
            .map(|threshold| TokenBudgetWarning {
                estimated_tokens,
                threshold,
            });

        if let Some(warning) = token_warning {
            tracing::warn!(
                estimated_tokens = warning.estimated_tokens,
                threshold = warning.threshold,
                "Estimated tokens exceed per-minute budget"
            );
        }

        Ok(RatePermit {
            model: model.to_string(),
            token_warning,
            _slot: slot,
        })
    }

    pub async fn available_slots(&self, model: &str) -> usize {
        self.gate(model).await.slots.available_permits()
    }

    pub async fn limits(&self, model: &str) -> ModelLimits {
        self.gate(model).await.limits
    }

    pub async fn snapshot(&self) -> Vec<RateLimiterSnapshot> {
        let gates: Vec<(String, Arc<ModelGate>)> = self
            .gates
            .read()
            .await
            .iter()
            .map(|(model, gate)| (model.clone(), Arc::clone(gate)))
            .collect();

        let mut snapshots = Vec::with_capacity(gates.len());
        for (model, gate) in gates {
            snapshots.push(RateLimiterSnapshot {
                model,
                max_concurrent: gate.limits.max_concurrent,
                available_slots: gate.slots.available_permits(),
                recent_requests: gate.recent_count().await,
                requests_per_minute: gate.limits.requests_per_minute,
                tokens_per_minute: gate.limits.tokens_per_minute,
            });
        }
        snapshots.sort_by(|a, b| a.model.cmp(&b.model));
        snapshots
    }

    async fn gate(&self, model: &str) -> Arc<ModelGate> {
        if let Some(gate) = self.gates.read().await.get(model) {
            return Arc::clone(gate);
        }

        let mut gates = self.gates.write().await;
        let gate = gates
            .entry(model.to_string())
            .or_insert_with(|| Arc::new(ModelGate::new(self.default_limits)));
        Arc::clone(gate)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(ModelLimits::default())
    }
}
