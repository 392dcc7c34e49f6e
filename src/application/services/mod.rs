mod batch_orchestrator;
mod fallback_response;
mod file_task;
mod model_fallback_chain;
mod model_stats;
mod prompts;
mod rate_limiter;
mod retry_policy;
mod token_counter;
mod transcript_splitter;
mod transcription_service;

pub use batch_orchestrator::{
    BatchOrchestrator, JobResults, OrchestratorError, OrchestratorSettings, SubmitBatchRequest,
    SubmittedBatch, UNKNOWN_GROUP,
};
pub use fallback_response::{MAX_LISTED_ITEMS, fallback_response};
pub use file_task::{FileTaskError, FileTaskRunner};
pub use model_fallback_chain::{
    AnalysisOutcome, ChainSettings, DEFAULT_MAX_INPUT_TOKENS, ModelFallbackChain,
    TRUNCATION_NOTICE,
};
pub use model_stats::{ModelAttemptStats, ModelStatsRegistry};
pub use prompts::{PromptBundle, TranscriptPart};
pub use rate_limiter::{
    ModelLimits, RateLimiter, RateLimiterError, RateLimiterSnapshot, RatePermit,
    TokenBudgetWarning,
};
pub use retry_policy::{
    FailureClass, RateLimitKind, RetryDecision, RetryPolicy, RetryableError, classify_rate_limit,
};
pub use token_counter::{FALLBACK_CHARS_PER_TOKEN, count_tokens, estimate_tokens, heuristic_tokens};
pub use transcript_splitter::{
    FIRST_PART_DELIMITER, SECOND_PART_DELIMITER, SplitTranscript, TranscriptSplitter, sentences,
};
pub use transcription_service::{
    DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, NO_SPEECH_PLACEHOLDER, TranscriptionService,
    TranscriptionSettings,
};
