use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};

/// Characters per token assumed for models without a known tokenizer. Hangul-heavy
/// transcripts land close to two characters per token.
pub const FALLBACK_CHARS_PER_TOKEN: usize = 2;

static CL100K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| load(tiktoken_rs::cl100k_base()));

static O200K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| load(tiktoken_rs::o200k_base()));

fn load(result: anyhow::Result<CoreBPE>) -> Option<CoreBPE> {
    match result {
        Ok(bpe) => Some(bpe),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to initialize tokenizer, using character heuristic");
            None
        }
    }
}

/// Token count under `cl100k_base`, the encoding shared by the GPT-4 family.
pub fn count_tokens(text: &str) -> usize {
    match CL100K.as_ref() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => heuristic_tokens(text),
    }
}

/// Best-effort token estimate for `model`.
///
/// Models known to tiktoken are counted exactly; anything else (Gemini, unreleased
/// OpenAI models) falls back to [`FALLBACK_CHARS_PER_TOKEN`].
pub fn estimate_tokens(text: &str, model: &str) -> usize {
    let bpe = match get_tokenizer(model) {
        Some(Tokenizer::O200kBase) => O200K.as_ref(),
        Some(Tokenizer::Cl100kBase) => CL100K.as_ref(),
        _ => None,
    };

    match bpe {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => heuristic_tokens(text),
    }
}

pub fn heuristic_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(FALLBACK_CHARS_PER_TOKEN)
}
