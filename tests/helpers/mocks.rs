use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bomatic::application::ports::{
    Completion, CompletionStatus, LlmClient, LlmClientError, StagingStore, StagingStoreError,
    TranscriptionError, TranscriptionPoll, TranscriptionProvider, TranscriptionRequest,
    TranscriptionState,
};
use bomatic::domain::StoragePath;

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    RateLimited(String),
    SafetyBlocked,
    Empty,
    Unfinished(String),
    Failure(String),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }

    fn into_result(self) -> Result<Completion, LlmClientError> {
        match self {
            Reply::Text(text) => Ok(Completion::completed(text)),
            Reply::RateLimited(message) => Err(LlmClientError::RateLimited(message)),
            Reply::SafetyBlocked => Ok(Completion {
                status: CompletionStatus::SafetyBlocked,
                text: None,
            }),
            Reply::Empty => Ok(Completion {
                status: CompletionStatus::Completed,
                text: Some("   ".to_string()),
            }),
            Reply::Unfinished(reason) => Ok(Completion {
                status: CompletionStatus::Unknown(reason),
                text: None,
            }),
            Reply::Failure(message) => Err(LlmClientError::ApiRequestFailed(message)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system_prompt: String,
    pub user_text: String,
}

/// Replies from a per-model queue, then repeats the model's fallback reply.
pub struct ScriptedLlmClient {
    queues: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallbacks: Mutex<HashMap<String, Reply>>,
    default_reply: Reply,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlmClient {
    pub fn new(default_reply: Reply) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            fallbacks: Mutex::new(HashMap::new()),
            default_reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, model: &str, replies: Vec<Reply>) -> Self {
        self.queues
            .lock()
            .unwrap()
            .insert(model.to_string(), replies.into());
        self
    }

    pub fn always(self, model: &str, reply: Reply) -> Self {
        self.fallbacks
            .lock()
            .unwrap()
            .insert(model.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.model == model)
            .count()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Completion, LlmClientError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
            user_text: user_text.to_string(),
        });

        let scripted = self
            .queues
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(VecDeque::pop_front);

        let reply = scripted.unwrap_or_else(|| {
            self.fallbacks
                .lock()
                .unwrap()
                .get(model)
                .cloned()
                .unwrap_or_else(|| self.default_reply.clone())
        });

        reply.into_result()
    }
}

/// How the mock speech-to-text service treats audio whose URL contains a key.
#[derive(Debug, Clone)]
pub enum SpeechScript {
    Transcript(String),
    Silence,
    NeverFinishes,
    Fails(String),
}

/// Request ids are the submitted audio URLs. Unscripted audio is transcribed as
/// "transcript of <url>".
pub struct MockTranscriptionProvider {
    scripts: Vec<(String, SpeechScript)>,
    submits: AtomicUsize,
    polls: AtomicUsize,
}

impl MockTranscriptionProvider {
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, url_contains: &str, script: SpeechScript) -> Self {
        self.scripts.push((url_contains.to_string(), script));
        self
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn script_for(&self, url: &str) -> Option<&SpeechScript> {
        self.scripts
            .iter()
            .find(|(key, _)| url.contains(key.as_str()))
            .map(|(_, script)| script)
    }
}

#[async_trait::async_trait]
impl TranscriptionProvider for MockTranscriptionProvider {
    async fn submit(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(request.audio_url.clone())
    }

    async fn poll(&self, request_id: &str) -> Result<TranscriptionPoll, TranscriptionError> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        let poll = match self.script_for(request_id) {
            Some(SpeechScript::Transcript(text)) => TranscriptionPoll {
                state: TranscriptionState::Transcribed,
                text: Some(text.clone()),
                error_message: None,
            },
            Some(SpeechScript::Silence) => TranscriptionPoll {
                state: TranscriptionState::Transcribed,
                text: None,
                error_message: None,
            },
            Some(SpeechScript::NeverFinishes) => TranscriptionPoll {
                state: TranscriptionState::Processing,
                text: None,
                error_message: None,
            },
            Some(SpeechScript::Fails(reason)) => TranscriptionPoll {
                state: TranscriptionState::Failed,
                text: None,
                error_message: Some(reason.clone()),
            },
            None => TranscriptionPoll {
                state: TranscriptionState::Transcribed,
                text: Some(format!("transcript of {}", request_id)),
                error_message: None,
            },
        };
        Ok(poll)
    }
}

/// Signed URLs are `memory://<path>`; objects exist once [`upload`](Self::upload)ed.
#[derive(Default)]
pub struct MockStagingStore {
    objects: Mutex<HashSet<String>>,
    issued_writes: AtomicUsize,
}

impl MockStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(&self, path: &StoragePath) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.as_str().to_string());
    }

    pub fn issued_writes(&self) -> usize {
        self.issued_writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StagingStore for MockStagingStore {
    async fn issue_write_url(
        &self,
        path: &StoragePath,
        _ttl: Duration,
    ) -> Result<String, StagingStoreError> {
        self.issued_writes.fetch_add(1, Ordering::SeqCst);
        Ok(format!("memory://{}", path))
    }

    async fn issue_read_url(
        &self,
        path: &StoragePath,
        _ttl: Duration,
    ) -> Result<Option<String>, StagingStoreError> {
        let exists = self.objects.lock().unwrap().contains(path.as_str());
        Ok(exists.then(|| format!("memory://{}", path)))
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool, StagingStoreError> {
        Ok(self.objects.lock().unwrap().contains(path.as_str()))
    }
}
