/*!
 * On-device ("built-in") AI capabilities.
 *
 * Each capability is reached through a `SessionProvider`: it reports the
 * capability's availability and creates sessions bound to one configuration.
 * A `DeviceRuntime` bundles one provider per capability and is injected into
 * the dispatcher. Capabilities the device lacks are filled with a
 * `NullProvider`, which always reports `unavailable`.
 *
 * - `availability`: the availability prober
 * - `local_model`: providers backed by a model served by a local Ollama daemon
 * - `null`: the null provider
 * - `options`: configuration and result types
 * - `streaming`: conversion of cumulative streaming snapshots to chunks
 */

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::fmt::Debug;
use std::sync::Arc;

use crate::capability::{AvailabilityState, Capability};
use crate::errors::LocalError;

pub mod availability;
pub mod local_model;
pub mod null;
pub mod options;
pub mod streaming;

pub use availability::AvailabilityProber;
pub use null::NullProvider;
pub use options::{
    ChatMessage, ChatSessionOptions, Correction, LanguageDetection, LanguagePair,
    ProofreadResult, ProofreaderOptions, RewriterFormat, RewriterLength, RewriterOptions,
    RewriterTone, SummarizerOptions, SummaryType, TextFormat, TextLength, WriterOptions,
    WriterTone,
};

/// Callback receiving model download progress in the range `0.0..=1.0`
pub type DownloadMonitor = Arc<dyn Fn(f64) + Send + Sync>;

/// A live on-device session
///
/// Sessions own model resources and must be released with `destroy`. Only the
/// session manager calls it for cached sessions.
pub trait DeviceSession: Send + Sync + Debug {
    /// Release the resources held by this session
    fn destroy(&self);
}

/// Conversational session of the prompt capability
#[async_trait]
pub trait ChatSession: DeviceSession {
    /// Send a message and wait for the full answer
    ///
    /// `constraint` is a JSON schema the answer must follow, if the device supports it.
    async fn prompt(
        &self,
        input: &str,
        constraint: Option<&serde_json::Value>,
    ) -> Result<String, LocalError>;

    /// Send a message and receive the answer as cumulative text snapshots
    ///
    /// Every item holds the whole answer so far. The default implementation
    /// yields a single snapshot with the complete answer.
    async fn prompt_streaming(
        &self,
        input: &str,
    ) -> Result<BoxStream<'static, Result<String, LocalError>>, LocalError> {
        let answer = self.prompt(input, None).await?;
        Ok(stream::once(futures::future::ready(Ok(answer))).boxed())
    }
}

#[async_trait]
pub trait SummarizerSession: DeviceSession {
    async fn summarize(&self, text: &str) -> Result<String, LocalError>;
}

#[async_trait]
pub trait WriterSession: DeviceSession {
    async fn write(&self, prompt: &str) -> Result<String, LocalError>;
}

#[async_trait]
pub trait RewriterSession: DeviceSession {
    async fn rewrite(&self, text: &str) -> Result<String, LocalError>;
}

#[async_trait]
pub trait TranslatorSession: DeviceSession {
    async fn translate(&self, text: &str) -> Result<String, LocalError>;
}

#[async_trait]
pub trait LanguageDetectorSession: DeviceSession {
    /// Candidates ordered by decreasing confidence
    async fn detect(&self, text: &str) -> Result<Vec<LanguageDetection>, LocalError>;
}

#[async_trait]
pub trait ProofreaderSession: DeviceSession {
    async fn proofread(&self, text: &str) -> Result<ProofreadResult, LocalError>;
}

/// Entry point of one on-device capability
#[async_trait]
pub trait SessionProvider: Send + Sync + Debug {
    /// Configuration a session is bound to
    type Options: Send + Sync;

    /// Session handle produced by this provider
    type Session: ?Sized + DeviceSession;

    /// Capability this provider implements
    fn capability(&self) -> Capability;

    /// Current readiness for the given configuration
    async fn availability(&self, options: &Self::Options) -> Result<AvailabilityState, LocalError>;

    /// Create a session, downloading the model first if needed
    async fn create(
        &self,
        options: &Self::Options,
        monitor: Option<DownloadMonitor>,
    ) -> Result<Arc<Self::Session>, LocalError>;
}

pub type PromptProvider = dyn SessionProvider<Options = ChatSessionOptions, Session = dyn ChatSession>;
pub type SummarizerProvider =
    dyn SessionProvider<Options = SummarizerOptions, Session = dyn SummarizerSession>;
pub type WriterProvider = dyn SessionProvider<Options = WriterOptions, Session = dyn WriterSession>;
pub type RewriterProvider =
    dyn SessionProvider<Options = RewriterOptions, Session = dyn RewriterSession>;
pub type TranslatorProvider =
    dyn SessionProvider<Options = LanguagePair, Session = dyn TranslatorSession>;
pub type LanguageDetectorProvider =
    dyn SessionProvider<Options = (), Session = dyn LanguageDetectorSession>;
pub type ProofreaderProvider =
    dyn SessionProvider<Options = ProofreaderOptions, Session = dyn ProofreaderSession>;

/// The set of on-device providers available to this process
#[derive(Debug, Clone)]
pub struct DeviceRuntime {
    pub prompt: Arc<PromptProvider>,
    pub summarizer: Arc<SummarizerProvider>,
    pub writer: Arc<WriterProvider>,
    pub rewriter: Arc<RewriterProvider>,
    pub translator: Arc<TranslatorProvider>,
    pub language_detector: Arc<LanguageDetectorProvider>,
    pub proofreader: Arc<ProofreaderProvider>,
}

impl DeviceRuntime {
    /// A runtime where every capability is unavailable
    pub fn unavailable() -> Self {
        Self {
            prompt: Arc::new(NullProvider::<ChatSessionOptions, dyn ChatSession>::new(
                Capability::Prompt,
            )),
            summarizer: Arc::new(
                NullProvider::<SummarizerOptions, dyn SummarizerSession>::new(
                    Capability::Summarizer,
                ),
            ),
            writer: Arc::new(NullProvider::<WriterOptions, dyn WriterSession>::new(
                Capability::Writer,
            )),
            rewriter: Arc::new(NullProvider::<RewriterOptions, dyn RewriterSession>::new(
                Capability::Rewriter,
            )),
            translator: Arc::new(NullProvider::<LanguagePair, dyn TranslatorSession>::new(
                Capability::Translator,
            )),
            language_detector: Arc::new(
                NullProvider::<(), dyn LanguageDetectorSession>::new(Capability::LanguageDetector),
            ),
            proofreader: Arc::new(
                NullProvider::<ProofreaderOptions, dyn ProofreaderSession>::new(
                    Capability::Proofreader,
                ),
            ),
        }
    }

    pub fn with_prompt(mut self, provider: Arc<PromptProvider>) -> Self {
        self.prompt = provider;
        self
    }

    pub fn with_summarizer(mut self, provider: Arc<SummarizerProvider>) -> Self {
        self.summarizer = provider;
        self
    }

    pub fn with_writer(mut self, provider: Arc<WriterProvider>) -> Self {
        self.writer = provider;
        self
    }

    pub fn with_rewriter(mut self, provider: Arc<RewriterProvider>) -> Self {
        self.rewriter = provider;
        self
    }

    pub fn with_translator(mut self, provider: Arc<TranslatorProvider>) -> Self {
        self.translator = provider;
        self
    }

    pub fn with_language_detector(mut self, provider: Arc<LanguageDetectorProvider>) -> Self {
        self.language_detector = provider;
        self
    }

    pub fn with_proofreader(mut self, provider: Arc<ProofreaderProvider>) -> Self {
        self.proofreader = provider;
        self
    }
}

impl Default for DeviceRuntime {
    fn default() -> Self {
        Self::unavailable()
    }
}
