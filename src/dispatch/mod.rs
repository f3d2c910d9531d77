/*!
 * Fallback dispatcher: on-device first, remote proxy second.
 *
 * Every operation probes the on-device capability, runs it through a cached
 * (or one-shot) session when it is `available`, and otherwise, or when the
 * on-device attempt fails, calls the equivalent remote endpoint with the same
 * inputs. The caller gets the same type either way. Only a remote failure
 * fails an operation.
 *
 * - `outcome`: the `LocalOutcome` pipeline and `settle`
 * - `lessons`: lesson generation with structured output
 */

use futures::stream::{self, BoxStream};
use futures::{StreamExt, future};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app_config::Config;
use crate::builtin::local_model::LocalModel;
use crate::builtin::streaming::incremental_chunks;
use crate::builtin::{
    AvailabilityProber, ChatMessage, ChatSession, ChatSessionOptions, DeviceRuntime,
    LanguageDetection, LanguageDetectorSession, LanguagePair, ProofreadResult, ProofreaderOptions,
    RewriterOptions, SummarizerOptions, TranslatorSession, WriterOptions,
};
use crate::capability::{AvailabilityState, Capability};
use crate::errors::{AiError, LocalError};
use crate::language_utils::{language_code_from_name, language_codes_match};
use crate::prompts::PromptTemplate;
use crate::providers::{PromptRequest, RemoteBackend, RemoteProxyClient};
use crate::session::manager::release;
use crate::session::{SessionKey, SessionManager};

pub mod lessons;
pub mod outcome;

pub use outcome::{LocalOutcome, settle};

/// Confidence given to a language reported by the remote proxy
const REMOTE_DETECTION_CONFIDENCE: f32 = 1.0;

/// Candidates kept by `detect_language` unless the caller asks otherwise
pub const DEFAULT_DETECTION_RESULTS: usize = 3;

/// The conversation a prompt belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub chat_id: u64,
    /// Earlier messages; seeds a new on-device session and goes with remote requests
    pub history: Vec<ChatMessage>,
}

impl ChatContext {
    pub fn new(chat_id: u64) -> Self {
        Self {
            chat_id,
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// Result of an automatic translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub text: String,
    /// Source language found by on-device detection, if it ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
}

/// Routes every AI operation to the on-device tier or the remote proxy
#[derive(Debug, Clone)]
pub struct FallbackDispatcher {
    device: Arc<DeviceRuntime>,
    prober: AvailabilityProber,
    sessions: Arc<SessionManager>,
    remote: Arc<dyn RemoteBackend>,
    system_prompt: String,
}

impl FallbackDispatcher {
    pub fn new(device: Arc<DeviceRuntime>, sessions: Arc<SessionManager>, remote: Arc<dyn RemoteBackend>) -> Self {
        Self {
            prober: AvailabilityProber::new(Arc::clone(&device)),
            device,
            sessions,
            remote,
            system_prompt: PromptTemplate::ASSISTANT.to_string(),
        }
    }

    /// Build the dispatcher described by the configuration
    ///
    /// The on-device tier is the local model when enabled, nothing otherwise.
    pub fn from_config(config: &Config, sessions: Arc<SessionManager>) -> Self {
        let device = if config.local_model.enabled {
            Arc::new(LocalModel::from_config(&config.local_model)).runtime()
        } else {
            DeviceRuntime::unavailable()
        };
        let remote = Arc::new(RemoteProxyClient::from_config(&config.proxy));

        Self::new(Arc::new(device), sessions, remote).with_system_prompt(config.chat.system_prompt.clone())
    }

    /// System prompt of new conversations
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn prober(&self) -> &AvailabilityProber {
        &self.prober
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn remote(&self) -> &Arc<dyn RemoteBackend> {
        &self.remote
    }

    async fn probe(&self, capability: Capability) -> AvailabilityState {
        self.prober.check_availability(capability, None).await
    }

    fn chat_options(&self, chat: &ChatContext) -> ChatSessionOptions {
        ChatSessionOptions::new(self.system_prompt.clone()).with_history(chat.history.clone())
    }

    fn prompt_request(&self, chat: &ChatContext, input: &str) -> PromptRequest {
        PromptRequest::new(input)
            .system(self.system_prompt.clone())
            .history(chat.history.clone())
    }

    async fn chat_session(&self, chat_id: u64, options: &ChatSessionOptions) -> Result<Arc<dyn ChatSession>, LocalError> {
        let monitor = self.sessions.download_monitor();
        self.sessions
            .chats()
            .get_or_create(&SessionKey::chat(chat_id), || self.device.prompt.create(options, monitor))
            .await
    }

    async fn detector_session(&self) -> Result<Arc<dyn LanguageDetectorSession>, LocalError> {
        let monitor = self.sessions.download_monitor();
        self.sessions
            .detectors()
            .get_or_create(&SessionManager::detector_key(), || self.device.language_detector.create(&(), monitor))
            .await
    }

    async fn translator_session(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslatorSession>, LocalError> {
        let key = pair.session_key();
        if let Some(session) = self.sessions.translators().get(&key) {
            self.sessions.report_progress(1.0);
            return Ok(session);
        }

        let monitor = self.sessions.download_monitor();
        self.sessions
            .translators()
            .get_or_create(&key, || self.device.translator.create(pair, monitor))
            .await
    }

    /// Send a message in a conversation
    pub async fn prompt(&self, chat: &ChatContext, input: &str) -> Result<String, AiError> {
        let options = self.chat_options(chat);
        let state = self.probe(Capability::Prompt).await;
        let outcome = LocalOutcome::attempt(state, || async {
            let session = self.chat_session(chat.chat_id, &options).await?;
            session.prompt(input, None).await
        })
        .await;

        let request = self.prompt_request(chat, input);
        settle(Capability::Prompt, outcome, || self.remote.prompt(&request)).await
    }

    /// Send a message and receive the answer as incremental chunks
    ///
    /// Falls back only if the on-device stream cannot be started. A stream that
    /// breaks off later ends with `AiError::StreamInterrupted`. The remote
    /// answer arrives as a single chunk.
    pub async fn prompt_streaming(
        &self,
        chat: &ChatContext,
        input: &str,
    ) -> Result<BoxStream<'static, Result<String, AiError>>, AiError> {
        let options = self.chat_options(chat);
        let state = self.probe(Capability::Prompt).await;
        let outcome = LocalOutcome::attempt(state, || async {
            let session = self.chat_session(chat.chat_id, &options).await?;
            session.prompt_streaming(input).await
        })
        .await
        .map(|snapshots| {
            incremental_chunks(snapshots)
                .map(|chunk| chunk.map_err(|e| AiError::StreamInterrupted(e.to_string())))
                .boxed()
        });

        let request = self.prompt_request(chat, input);
        settle(Capability::Prompt, outcome, || async {
            let answer = self.remote.prompt(&request).await?;
            Ok::<_, AiError>(stream::once(future::ready(Ok(answer))).boxed())
        })
        .await
    }

    /// Destroy the on-device session of a conversation
    pub fn end_chat(&self, chat_id: u64) -> bool {
        self.sessions.remove_chat_session(chat_id)
    }

    pub async fn summarize(&self, text: &str, options: &SummarizerOptions) -> Result<String, AiError> {
        let state = self.probe(Capability::Summarizer).await;
        let outcome = LocalOutcome::attempt(state, || async {
            let monitor = self.sessions.download_monitor();
            let session = self
                .sessions
                .summarizers()
                .get_or_create(&options.session_key(), || self.device.summarizer.create(options, monitor))
                .await?;
            session.summarize(text).await
        })
        .await;

        settle(Capability::Summarizer, outcome, || self.remote.summarize(text, options)).await
    }

    /// Short headline for a conversation
    pub async fn conversation_title(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        let conversation = messages
            .iter()
            .map(|message| format!("{}: {}", message.role, message.content))
            .collect::<Vec<_>>()
            .join("\n");

        let title = self.summarize(&conversation, &SummarizerOptions::headline()).await?;
        Ok(title.trim().trim_matches('"').trim().to_string())
    }

    /// Generate text; the writer session is one-shot
    pub async fn write(&self, prompt: &str, options: &WriterOptions) -> Result<String, AiError> {
        let state = self.probe(Capability::Writer).await;
        let outcome = LocalOutcome::attempt(state, || async {
            let session = self
                .device
                .writer
                .create(options, self.sessions.download_monitor())
                .await?;
            let result = session.write(prompt).await;
            release(Capability::Writer, session.as_ref());
            result
        })
        .await;

        settle(Capability::Writer, outcome, || self.remote.write(prompt, options)).await
    }

    /// Rewrite text; the rewriter session is one-shot
    pub async fn rewrite(&self, text: &str, options: &RewriterOptions) -> Result<String, AiError> {
        let state = self.probe(Capability::Rewriter).await;
        let outcome = LocalOutcome::attempt(state, || async {
            let session = self
                .device
                .rewriter
                .create(options, self.sessions.download_monitor())
                .await?;
            let result = session.rewrite(text).await;
            release(Capability::Rewriter, session.as_ref());
            result
        })
        .await;

        settle(Capability::Rewriter, outcome, || self.remote.rewrite(text, options)).await
    }

    /// Rewrite text more clearly, in the language it is written in
    pub async fn rewrite_clearly(&self, text: &str) -> Result<String, AiError> {
        let language = self.primary_language(text).await;
        let options = RewriterOptions::default().with_language(language);
        self.rewrite(text, &options).await
    }

    async fn local_detection(&self, text: &str) -> LocalOutcome<Vec<LanguageDetection>> {
        let state = self.probe(Capability::LanguageDetector).await;
        LocalOutcome::attempt(state, || async {
            let session = self.detector_session().await?;
            session.detect(text).await
        })
        .await
    }

    /// Most likely language of `text` according to the on-device detector
    ///
    /// `None` when the detector is unavailable or fails; never calls the remote proxy.
    pub async fn primary_language(&self, text: &str) -> Option<String> {
        match self.local_detection(text).await {
            LocalOutcome::Success(detections) => detections
                .into_iter()
                .next()
                .map(|detection| detection.detected_language),
            LocalOutcome::Unavailable(state) => {
                debug!("On-device language detection is {}", state);
                None
            }
            LocalOutcome::Failed(e) => {
                warn!("On-device language detection failed: {}", e);
                None
            }
        }
    }

    /// Up to `top_results` language candidates of `text`, most likely first
    ///
    /// The remote proxy names a single language; it is converted to an ISO
    /// code when the name is recognized.
    pub async fn detect_language(&self, text: &str, top_results: usize) -> Result<Vec<LanguageDetection>, AiError> {
        let outcome = self.local_detection(text).await.map(|mut detections| {
            detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            detections.truncate(top_results);
            detections
        });
        settle(Capability::LanguageDetector, outcome, || async {
            let language = self.remote.detect_language(text).await?;
            let detected_language = language_code_from_name(&language).unwrap_or(language);
            Ok::<_, AiError>(vec![LanguageDetection {
                detected_language,
                confidence: REMOTE_DETECTION_CONFIDENCE,
            }])
        })
        .await
    }

    /// Translate `text` into `target_language`
    ///
    /// The source language comes from on-device detection; text already in the
    /// target language is returned unchanged. Without a source the
    /// on-device translator cannot be built and the remote proxy infers the
    /// source; the remote request never carries one.
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<Translation, AiError> {
        let source_language = self.primary_language(text).await;

        if source_language
            .as_deref()
            .is_some_and(|source| language_codes_match(source, target_language))
        {
            debug!("Text is already in '{}', nothing to translate", target_language);
            return Ok(Translation {
                text: text.to_string(),
                source_language,
            });
        }

        let outcome = match &source_language {
            Some(source) => {
                let pair = LanguagePair::new(source.clone(), target_language);
                let state = self.prober.check_availability(Capability::Translator, Some(&pair)).await;
                LocalOutcome::attempt(state, || async {
                    let session = self.translator_session(&pair).await?;
                    session.translate(text).await
                })
                .await
            }
            None => {
                debug!("Source language unknown, skipping the on-device translator");
                LocalOutcome::Unavailable(AvailabilityState::Unavailable)
            }
        };

        let translated = settle(Capability::Translator, outcome, || {
            self.remote.translate(text, None, target_language)
        })
        .await?;

        Ok(Translation {
            text: translated,
            source_language,
        })
    }

    /// Proofread text; the proofreader session is one-shot
    pub async fn proofread(&self, text: &str) -> Result<ProofreadResult, AiError> {
        let options = ProofreaderOptions::default();
        let state = self.probe(Capability::Proofreader).await;
        let outcome = LocalOutcome::attempt(state, || async {
            let session = self
                .device
                .proofreader
                .create(&options, self.sessions.download_monitor())
                .await?;
            let result = session.proofread(text).await;
            release(Capability::Proofreader, session.as_ref());
            result
        })
        .await;

        settle(Capability::Proofreader, outcome, || async {
            let corrected = self.remote.proofread(text).await?;
            Ok::<_, AiError>(ProofreadResult::corrected(corrected))
        })
        .await
    }

    /// Whether the remote proxy is up
    pub async fn health(&self) -> Result<(), AiError> {
        Ok(self.remote.health().await?)
    }

    /// Destroy every cached on-device session
    pub fn dispose(&self) -> usize {
        self.sessions.dispose()
    }
}
