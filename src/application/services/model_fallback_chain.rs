use std::borrow::Cow;
use std::sync::Arc;

use crate::application::ports::{CompletionStatus, LlmClient, LlmClientError};
use crate::domain::AiProvider;

use super::fallback_response::fallback_response;
use super::model_stats::ModelStatsRegistry;
use super::prompts::{PromptBundle, TranscriptPart};
use super::rate_limiter::RateLimiter;
use super::retry_policy::{FailureClass, RetryPolicy, RetryableError};
use super::token_counter::estimate_tokens;
use super::transcript_splitter::TranscriptSplitter;

pub const DEFAULT_MAX_INPUT_TOKENS: usize = 28_000;
const TRUNCATION_KEEP_NUMERATOR: usize = 4;
const TRUNCATION_KEEP_DENOMINATOR: usize = 5;
pub const TRUNCATION_NOTICE: &str =
    "\n\n[Transcript truncated: the remainder exceeded the model input limit and was omitted.]";

/// Outcome of [`ModelFallbackChain::analyze`]. Both variants carry usable analysis text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Analyzed { model: String, text: String },
    Degraded { last_error: String, fallback: String },
}

impl AnalysisOutcome {
    pub fn text(&self) -> &str {
        match self {
            AnalysisOutcome::Analyzed { text, .. } => text,
            AnalysisOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            AnalysisOutcome::Analyzed { text, .. } => text,
            AnalysisOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub models: Vec<String>,
    pub call_policy: RetryPolicy,
    pub chain_policy: RetryPolicy,
    pub max_input_tokens: usize,
}

/// Ordered models of one provider, tried until one produces a usable analysis.
///
/// Every sub-call holds a [`RateLimiter`] permit for its model and is retried under
/// `call_policy`; `chain_policy.max_attempts` caps how many models are tried. Long
/// transcripts are analyzed in two overlapping halves and reconciled with a merge call
/// against the same model.
pub struct ModelFallbackChain {
    provider: AiProvider,
    client: Arc<dyn LlmClient>,
    rate_limiter: Arc<RateLimiter>,
    stats: Arc<ModelStatsRegistry>,
    splitter: TranscriptSplitter,
    settings: ChainSettings,
}

impl ModelFallbackChain {
    pub fn new(
        provider: AiProvider,
        client: Arc<dyn LlmClient>,
        rate_limiter: Arc<RateLimiter>,
        stats: Arc<ModelStatsRegistry>,
        splitter: TranscriptSplitter,
        settings: ChainSettings,
    ) -> Self {
        Self {
            provider,
            client,
            rate_limiter,
            stats,
            splitter,
            settings,
        }
    }

    pub fn provider(&self) -> AiProvider {
        self.provider
    }

    pub fn models(&self) -> &[String] {
        &self.settings.models
    }

    #[tracing::instrument(skip(self, text, bundle), fields(provider = %self.provider, chars = text.len()))]
    pub async fn analyze(&self, text: &str, bundle: &PromptBundle) -> AnalysisOutcome {
        let max_models = self.settings.chain_policy.max_attempts as usize;
        let mut last_error: Option<String> = None;

        for model in self.settings.models.iter().take(max_models) {
            self.stats.record_attempt(self.provider, model).await;

            match self.analyze_with_model(model, text, bundle).await {
                Ok(analysis) => {
                    self.stats.record_success(self.provider, model).await;
                    tracing::info!(model = %model, "Analysis completed");
                    return AnalysisOutcome::Analyzed {
                        model: model.clone(),
                        text: analysis,
                    };
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "Model exhausted, trying next");
                    last_error = Some(format!("{}: {}", model, e));
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| "no analysis model configured".to_string());
        tracing::error!(error = %last_error, "All analysis models failed, returning fallback");

        AnalysisOutcome::Degraded {
            fallback: fallback_response(&last_error, &bundle.items),
            last_error,
        }
    }

    async fn analyze_with_model(
        &self,
        model: &str,
        text: &str,
        bundle: &PromptBundle,
    ) -> Result<String, LlmClientError> {
        let split = self.splitter.split(text);
        if !split.is_split() {
            let prompt = bundle.analysis_prompt(TranscriptPart::Whole);
            return self.complete(model, &prompt, text).await;
        }

        let first_prompt = bundle.analysis_prompt(TranscriptPart::First);
        let first = self.complete(model, &first_prompt, &split.first).await?;

        let second_prompt = bundle.analysis_prompt(TranscriptPart::Second);
        let second = self.complete(model, &second_prompt, &split.second).await?;

        let merge_request = self.splitter.merge_request(&first, &second);
        self.complete(model, &bundle.merge_prompt(), &merge_request)
            .await
    }

    /// One rate-limited, retried completion that must yield non-empty text.
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, LlmClientError> {
        let user_text = self.fit_input(model, system_prompt, user_text);
        let user_text: &str = &user_text;

        self.settings
            .call_policy
            .run("llm_completion", |attempt| async move {
                let estimated =
                    estimate_tokens(system_prompt, model) + estimate_tokens(user_text, model);

                let _permit = self
                    .rate_limiter
                    .acquire(model, estimated)
                    .await
                    .map_err(|e| LlmClientError::NotConfigured(e.to_string()))?;

                tracing::debug!(model, attempt, estimated_tokens = estimated, "Calling model");

                match self.client.complete(model, system_prompt, user_text).await {
                    Ok(completion) => match completion.usable_text() {
                        Some(text) => Ok(text.to_string()),
                        None => Err(unusable(&completion.status)),
                    },
                    Err(e) => {
                        if matches!(e.failure_class(), FailureClass::RateLimited(_)) {
                            self.stats.record_rate_limited(self.provider, model).await;
                        }
                        Err(e)
                    }
                }
            })
            .await
    }

    /// Cuts `user_text` to 80% of its characters until prompt and text fit the input
    /// budget, then appends [`TRUNCATION_NOTICE`].
    fn fit_input<'a>(&self, model: &str, system_prompt: &str, user_text: &'a str) -> Cow<'a, str> {
        let budget = self.settings.max_input_tokens;
        let prompt_tokens = estimate_tokens(system_prompt, model);
        if prompt_tokens + estimate_tokens(user_text, model) <= budget {
            return Cow::Borrowed(user_text);
        }

        let original_chars = user_text.chars().count();
        let mut body: String = user_text.to_string();
        while !body.is_empty() && prompt_tokens + estimate_tokens(&body, model) > budget {
            let keep = body.chars().count() * TRUNCATION_KEEP_NUMERATOR
                / TRUNCATION_KEEP_DENOMINATOR;
            body = body.chars().take(keep).collect();
        }

        tracing::warn!(
            model,
            original_chars,
            kept_chars = body.chars().count(),
            max_input_tokens = budget,
            "Input exceeds token budget, truncating"
        );

        body.push_str(TRUNCATION_NOTICE);
        Cow::Owned(body)
    }
}

fn unusable(status: &CompletionStatus) -> LlmClientError {
    match status {
        CompletionStatus::SafetyBlocked => {
            LlmClientError::SafetyBlocked("completion withheld by safety filter".to_string())
        }
        CompletionStatus::Truncated => {
            LlmClientError::UnusableCompletion("truncated completion without content".to_string())
        }
        CompletionStatus::Completed => {
            LlmClientError::UnusableCompletion("empty completion".to_string())
        }
        CompletionStatus::Unknown(reason) => {
            LlmClientError::UnusableCompletion(format!("unknown finish reason: {}", reason))
        }
    }
}
