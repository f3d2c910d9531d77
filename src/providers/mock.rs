/*!
 * Mock remote backend for testing.
 *
 * `MockRemote` records every call it receives and answers according to its
 * behavior:
 * - `MockRemote::working()` - answers every endpoint with a tagged echo
 * - `MockRemote::failing()` - always fails with an API error
 * - `MockRemote::intermittent(n)` - fails every n-th request
 * - `MockRemote::with_response(..)` - answers every text endpoint with a fixed string
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::builtin::{RewriterOptions, SummarizerOptions, WriterOptions};
use crate::capability::Capability;
use crate::errors::ProviderError;

use super::{PromptRequest, RemoteBackend};

/// One request received by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Prompt(PromptRequest),
    Summarize { text: String, options: SummarizerOptions },
    Write { prompt: String, options: WriterOptions },
    Rewrite { text: String, options: RewriterOptions },
    Translate {
        text: String,
        source_language: Option<String>,
        target_language: String,
    },
    DetectLanguage(String),
    Proofread(String),
    Health,
}

impl RemoteCall {
    /// Capability of the endpoint this call went to; `None` for the health check
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Self::Prompt(_) => Some(Capability::Prompt),
            Self::Summarize { .. } => Some(Capability::Summarizer),
            Self::Write { .. } => Some(Capability::Writer),
            Self::Rewrite { .. } => Some(Capability::Rewriter),
            Self::Translate { .. } => Some(Capability::Translator),
            Self::DetectLanguage(_) => Some(Capability::LanguageDetector),
            Self::Proofread(_) => Some(Capability::Proofreader),
            Self::Health => None,
        }
    }
}

/// Behavior mode for the mock remote
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a tagged echo of the input
    Working,
    /// Always succeeds with the given text
    Fixed(String),
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock remote backend
#[derive(Debug, Clone)]
pub struct MockRemote {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every call received, shared between clones
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    /// Name returned by `detect_language`
    detected_language: String,
}

impl MockRemote {
    /// Create a new mock remote with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            detected_language: "English".to_string(),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// A working mock answering every text endpoint with `response`
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fixed(response.into()))
    }

    /// Set the language name the detector endpoint answers with
    pub fn detecting(mut self, language: impl Into<String>) -> Self {
        self.detected_language = language.into();
        self
    }

    /// Number of requests received, health checks included
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<RemoteCall> {
        self.calls.lock().last().cloned()
    }

    /// Number of requests sent to the endpoint of `capability`
    pub fn calls_for(&self, capability: Capability) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.capability() == Some(capability))
            .count()
    }

    async fn respond(&self, call: RemoteCall, echo: String) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(call);

        match &self.behavior {
            MockBehavior::Working => Ok(echo),
            MockBehavior::Fixed(text) => Ok(text.clone()),
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(echo)
                }
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated proxy failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(echo)
            }
        }
    }
}

#[async_trait]
impl RemoteBackend for MockRemote {
    async fn prompt(&self, request: &PromptRequest) -> Result<String, ProviderError> {
        let echo = format!("[REMOTE] {}", request.prompt);
        self.respond(RemoteCall::Prompt(request.clone()), echo).await
    }

    async fn summarize(&self, text: &str, options: &SummarizerOptions) -> Result<String, ProviderError> {
        let call = RemoteCall::Summarize {
            text: text.to_string(),
            options: options.clone(),
        };
        self.respond(call, format!("[SUMMARY] {}", text)).await
    }

    async fn write(&self, prompt: &str, options: &WriterOptions) -> Result<String, ProviderError> {
        let call = RemoteCall::Write {
            prompt: prompt.to_string(),
            options: options.clone(),
        };
        self.respond(call, format!("[WRITTEN] {}", prompt)).await
    }

    async fn rewrite(&self, text: &str, options: &RewriterOptions) -> Result<String, ProviderError> {
        let call = RemoteCall::Rewrite {
            text: text.to_string(),
            options: options.clone(),
        };
        self.respond(call, format!("[REWRITTEN] {}", text)).await
    }

    async fn translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let call = RemoteCall::Translate {
            text: text.to_string(),
            source_language: source_language.map(str::to_string),
            target_language: target_language.to_string(),
        };
        self.respond(call, format!("[TRANSLATED to {}] {}", target_language, text)).await
    }

    async fn detect_language(&self, text: &str) -> Result<String, ProviderError> {
        let language = self.detected_language.clone();
        let answer = self.respond(RemoteCall::DetectLanguage(text.to_string()), language.clone()).await?;
        // A fixed response applies to text endpoints only
        match self.behavior {
            MockBehavior::Fixed(_) => Ok(language),
            _ => Ok(answer),
        }
    }

    async fn proofread(&self, text: &str) -> Result<String, ProviderError> {
        self.respond(RemoteCall::Proofread(text.to_string()), text.to_string()).await
    }

    async fn health(&self) -> Result<(), ProviderError> {
        self.respond(RemoteCall::Health, String::new()).await.map(|_| ())
    }
}
