/*!
 * On-device capabilities backed by a model served by a local Ollama daemon.
 *
 * Inference never leaves the machine. Availability follows the daemon's model
 * list: an unreachable daemon is `unavailable`, a missing model is
 * `downloadable`, a pull in progress is `downloading`. Creating a session
 * pulls the model first when needed.
 *
 * Every capability other than chat is a fixed system instruction rendered from
 * the session options, followed by the caller's text.
 */

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::app_config::LocalModelConfig;
use crate::capability::{AvailabilityState, Capability};
use crate::errors::LocalError;
use crate::language_utils::{language_code_from_name, normalize_to_part1_or_part2t, validate_language_code};
use crate::prompts::{
    PromptTemplate, rewriter_instruction, summarizer_instruction, summarizer_label,
    translator_instruction, writer_instruction,
};
use crate::providers::ollama::{ChatRequest, Ollama};

use super::{
    ChatMessage, ChatSession, ChatSessionOptions, DeviceRuntime, DeviceSession, DownloadMonitor,
    LanguageDetection, LanguageDetectorSession, LanguagePair, ProofreadResult, ProofreaderOptions,
    ProofreaderSession, RewriterOptions, RewriterSession, SessionProvider, SummarizerOptions,
    SummarizerSession, TranslatorSession, WriterOptions, WriterSession,
};

/// Temperature of instruction-style capabilities
const INSTRUCTION_TEMPERATURE: f32 = 0.2;

/// Confidence reported when the model names a language without one
const DEFAULT_CONFIDENCE: f32 = 0.5;

/// A language code followed by a confidence, e.g. `es 0.97`
static CODE_WITH_CONFIDENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]{2,3})\b[\s,:;(]*\b(0(?:\.\d+)?|1(?:\.0+)?)\b").unwrap()
});

/// Handle on the local model shared by every provider and session
#[derive(Debug)]
pub struct LocalModel {
    client: Ollama,
    model: String,
    pulling: AtomicBool,
}

impl LocalModel {
    pub fn new(client: Ollama, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            pulling: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &LocalModelConfig) -> Self {
        Self::new(
            Ollama::from_url(config.endpoint.clone(), Duration::from_secs(config.timeout_secs)),
            config.model.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Readiness of the model
    pub async fn state(&self) -> AvailabilityState {
        if self.pulling.load(Ordering::SeqCst) {
            return AvailabilityState::Downloading;
        }
        match self.client.has_model(&self.model).await {
            Ok(true) => AvailabilityState::Available,
            Ok(false) => AvailabilityState::Downloadable,
            Err(e) => {
                debug!("Local model daemon at {} is not reachable: {}", self.client.base_url(), e);
                AvailabilityState::Unavailable
            }
        }
    }

    /// Make sure the model is installed, pulling it if it is only downloadable
    async fn ensure_model(&self, capability: Capability, monitor: Option<&DownloadMonitor>) -> Result<(), LocalError> {
        match self.state().await {
            AvailabilityState::Available => Ok(()),
            AvailabilityState::Downloadable => self.download(capability, monitor).await,
            state => Err(LocalError::Unavailable { capability, state }),
        }
    }

    async fn download(&self, capability: Capability, monitor: Option<&DownloadMonitor>) -> Result<(), LocalError> {
        if self
            .pulling
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LocalError::Unavailable {
                capability,
                state: AvailabilityState::Downloading,
            });
        }

        info!("Downloading local model {}", self.model);
        let result = self
            .client
            .pull(&self.model, |status| {
                if let (Some(monitor), Some(fraction)) = (monitor, status.fraction()) {
                    monitor(fraction);
                }
            })
            .await;
        self.pulling.store(false, Ordering::SeqCst);

        result.map_err(|e| LocalError::session_creation(capability, e))?;
        if let Some(monitor) = monitor {
            monitor(1.0);
        }
        info!("Local model {} is ready", self.model);
        Ok(())
    }

    async fn chat(
        &self,
        capability: Capability,
        messages: Vec<ChatMessage>,
        format: Option<serde_json::Value>,
        temperature: Option<f32>,
    ) -> Result<String, LocalError> {
        let mut request = ChatRequest::new(self.model.clone(), messages);
        if let Some(format) = format {
            request = request.format(format);
        }
        if let Some(temperature) = temperature {
            request = request.temperature(temperature);
        }

        let response = self
            .client
            .chat(request)
            .await
            .map_err(|e| LocalError::operation(capability, e))?;
        Ok(response.message.content.trim().to_string())
    }

    /// Run a one-turn instruction
    async fn instruct(&self, capability: Capability, instruction: &str, input: &str) -> Result<String, LocalError> {
        let messages = vec![ChatMessage::system(instruction), ChatMessage::user(input)];
        self.chat(capability, messages, None, Some(INSTRUCTION_TEMPERATURE)).await
    }

    /// A device runtime serving every capability with this model
    pub fn runtime(self: Arc<Self>) -> DeviceRuntime {
        DeviceRuntime {
            prompt: Arc::new(LocalProvider::<ChatSessionOptions>::new(Arc::clone(&self), Capability::Prompt)),
            summarizer: Arc::new(LocalProvider::<SummarizerOptions>::new(Arc::clone(&self), Capability::Summarizer)),
            writer: Arc::new(LocalProvider::<WriterOptions>::new(Arc::clone(&self), Capability::Writer)),
            rewriter: Arc::new(LocalProvider::<RewriterOptions>::new(Arc::clone(&self), Capability::Rewriter)),
            translator: Arc::new(LocalProvider::<LanguagePair>::new(Arc::clone(&self), Capability::Translator)),
            language_detector: Arc::new(LocalProvider::<()>::new(Arc::clone(&self), Capability::LanguageDetector)),
            proofreader: Arc::new(LocalProvider::<ProofreaderOptions>::new(self, Capability::Proofreader)),
        }
    }
}

/// Provider of one capability, parameterized by the options it takes
pub struct LocalProvider<O> {
    model: Arc<LocalModel>,
    capability: Capability,
    _options: PhantomData<fn(O)>,
}

impl<O> LocalProvider<O> {
    pub fn new(model: Arc<LocalModel>, capability: Capability) -> Self {
        Self {
            model,
            capability,
            _options: PhantomData,
        }
    }

    async fn prepare(&self, monitor: Option<DownloadMonitor>) -> Result<(), LocalError> {
        self.model.ensure_model(self.capability, monitor.as_ref()).await
    }

    fn text_session(&self, instruction: String) -> Arc<LocalTextSession> {
        Arc::new(LocalTextSession {
            model: Arc::clone(&self.model),
            capability: self.capability,
            instruction,
            destroyed: AtomicBool::new(false),
        })
    }
}

impl<O> std::fmt::Debug for LocalProvider<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvider")
            .field("capability", &self.capability)
            .field("model", &self.model.model)
            .finish()
    }
}

#[async_trait]
impl SessionProvider for LocalProvider<ChatSessionOptions> {
    type Options = ChatSessionOptions;
    type Session = dyn ChatSession;

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn availability(&self, _options: &ChatSessionOptions) -> Result<AvailabilityState, LocalError> {
        Ok(self.model.state().await)
    }

    async fn create(
        &self,
        options: &ChatSessionOptions,
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<dyn ChatSession>, LocalError> {
        self.prepare(monitor).await?;
        Ok(Arc::new(LocalChatSession {
            model: Arc::clone(&self.model),
            messages: Mutex::new(options.initial_prompts()),
            destroyed: AtomicBool::new(false),
        }))
    }
}

#[async_trait]
impl SessionProvider for LocalProvider<SummarizerOptions> {
    type Options = SummarizerOptions;
    type Session = dyn SummarizerSession;

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn availability(&self, _options: &SummarizerOptions) -> Result<AvailabilityState, LocalError> {
        Ok(self.model.state().await)
    }

    async fn create(
        &self,
        options: &SummarizerOptions,
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<dyn SummarizerSession>, LocalError> {
        self.prepare(monitor).await?;
        debug!("Local summarizer session: {}", summarizer_label(options));
        Ok(self.text_session(summarizer_instruction(options)))
    }
}

#[async_trait]
impl SessionProvider for LocalProvider<WriterOptions> {
    type Options = WriterOptions;
    type Session = dyn WriterSession;

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn availability(&self, _options: &WriterOptions) -> Result<AvailabilityState, LocalError> {
        Ok(self.model.state().await)
    }

    async fn create(
        &self,
        options: &WriterOptions,
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<dyn WriterSession>, LocalError> {
        self.prepare(monitor).await?;
        Ok(self.text_session(writer_instruction(options)))
    }
}

#[async_trait]
impl SessionProvider for LocalProvider<RewriterOptions> {
    type Options = RewriterOptions;
    type Session = dyn RewriterSession;

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn availability(&self, _options: &RewriterOptions) -> Result<AvailabilityState, LocalError> {
        Ok(self.model.state().await)
    }

    async fn create(
        &self,
        options: &RewriterOptions,
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<dyn RewriterSession>, LocalError> {
        self.prepare(monitor).await?;
        Ok(self.text_session(rewriter_instruction(options)))
    }
}

#[async_trait]
impl SessionProvider for LocalProvider<LanguagePair> {
    type Options = LanguagePair;
    type Session = dyn TranslatorSession;

    fn capability(&self) -> Capability {
        self.capability
    }

    /// Both languages must be valid ISO 639 codes
    async fn availability(&self, pair: &LanguagePair) -> Result<AvailabilityState, LocalError> {
        if validate_language_code(&pair.source_language).is_err()
            || validate_language_code(&pair.target_language).is_err()
        {
            debug!("Local translator does not support {}", pair);
            return Ok(AvailabilityState::Unavailable);
        }
        Ok(self.model.state().await)
    }

    async fn create(
        &self,
        pair: &LanguagePair,
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<dyn TranslatorSession>, LocalError> {
        let source = crate::language_utils::get_language_name(&pair.source_language)
            .map_err(|e| LocalError::session_creation(self.capability, e))?;
        let target = crate::language_utils::get_language_name(&pair.target_language)
            .map_err(|e| LocalError::session_creation(self.capability, e))?;

        self.prepare(monitor).await?;
        Ok(self.text_session(translator_instruction(&source, &target)))
    }
}

#[async_trait]
impl SessionProvider for LocalProvider<()> {
    type Options = ();
    type Session = dyn LanguageDetectorSession;

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn availability(&self, _options: &()) -> Result<AvailabilityState, LocalError> {
        Ok(self.model.state().await)
    }

    async fn create(
        &self,
        _options: &(),
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<dyn LanguageDetectorSession>, LocalError> {
        self.prepare(monitor).await?;
        Ok(self.text_session(PromptTemplate::LANGUAGE_DETECTOR.to_string()))
    }
}

#[async_trait]
impl SessionProvider for LocalProvider<ProofreaderOptions> {
    type Options = ProofreaderOptions;
    type Session = dyn ProofreaderSession;

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn availability(&self, _options: &ProofreaderOptions) -> Result<AvailabilityState, LocalError> {
        Ok(self.model.state().await)
    }

    async fn create(
        &self,
        _options: &ProofreaderOptions,
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<dyn ProofreaderSession>, LocalError> {
        self.prepare(monitor).await?;
        Ok(self.text_session(PromptTemplate::PROOFREADER.to_string()))
    }
}

/// Conversation with the local model
///
/// Keeps the system prompt and every completed exchange. A failed turn leaves
/// the conversation unchanged.
#[derive(Debug)]
pub struct LocalChatSession {
    model: Arc<LocalModel>,
    messages: Mutex<Vec<ChatMessage>>,
    destroyed: AtomicBool,
}

impl LocalChatSession {
    /// Messages exchanged so far, system prompt included
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.lock().clone()
    }
}

impl DeviceSession for LocalChatSession {
    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.messages.lock().clear();
    }
}

#[async_trait]
impl ChatSession for LocalChatSession {
    async fn prompt(&self, input: &str, constraint: Option<&serde_json::Value>) -> Result<String, LocalError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(LocalError::Destroyed(Capability::Prompt));
        }

        let user = ChatMessage::user(input);
        let mut messages = self.messages.lock().clone();
        messages.push(user.clone());

        let answer = self
            .model
            .chat(Capability::Prompt, messages, constraint.cloned(), None)
            .await?;

        let mut history = self.messages.lock();
        history.push(user);
        history.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }
}

/// Session running one fixed instruction against the local model
#[derive(Debug)]
pub struct LocalTextSession {
    model: Arc<LocalModel>,
    capability: Capability,
    instruction: String,
    destroyed: AtomicBool,
}

impl LocalTextSession {
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    async fn run(&self, input: &str) -> Result<String, LocalError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(LocalError::Destroyed(self.capability));
        }
        self.model.instruct(self.capability, &self.instruction, input).await
    }
}

impl DeviceSession for LocalTextSession {
    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SummarizerSession for LocalTextSession {
    async fn summarize(&self, text: &str) -> Result<String, LocalError> {
        self.run(text).await
    }
}

#[async_trait]
impl WriterSession for LocalTextSession {
    async fn write(&self, prompt: &str) -> Result<String, LocalError> {
        self.run(prompt).await
    }
}

#[async_trait]
impl RewriterSession for LocalTextSession {
    async fn rewrite(&self, text: &str) -> Result<String, LocalError> {
        self.run(text).await
    }
}

#[async_trait]
impl TranslatorSession for LocalTextSession {
    async fn translate(&self, text: &str) -> Result<String, LocalError> {
        self.run(text).await
    }
}

#[async_trait]
impl LanguageDetectorSession for LocalTextSession {
    async fn detect(&self, text: &str) -> Result<Vec<LanguageDetection>, LocalError> {
        let answer = self.run(text).await?;
        parse_detection(&answer)
            .map(|detection| vec![detection])
            .ok_or_else(|| LocalError::operation(self.capability, format!("Unrecognized language answer: {}", answer)))
    }
}

#[async_trait]
impl ProofreaderSession for LocalTextSession {
    async fn proofread(&self, text: &str) -> Result<ProofreadResult, LocalError> {
        Ok(ProofreadResult::corrected(self.run(text).await?))
    }
}

/// Read a language detection from the model's answer
///
/// Accepts `code confidence` pairs anywhere in the answer, then a bare code or
/// language name as its first word.
pub fn parse_detection(answer: &str) -> Option<LanguageDetection> {
    for captures in CODE_WITH_CONFIDENCE.captures_iter(answer) {
        let code = &captures[1];
        if validate_language_code(code).is_err() {
            continue;
        }
        if let Ok(normalized) = normalize_to_part1_or_part2t(code) {
            let confidence = captures[2].parse::<f32>().unwrap_or(DEFAULT_CONFIDENCE);
            return Some(LanguageDetection {
                detected_language: normalized,
                confidence: confidence.clamp(0.0, 1.0),
            });
        }
    }

    let first_word = answer
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .find(|word| !word.is_empty())?;
    language_code_from_name(first_word).map(|code| LanguageDetection {
        detected_language: code,
        confidence: DEFAULT_CONFIDENCE,
    })
}
