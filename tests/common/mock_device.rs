/*!
 * Scripted on-device providers for testing
 *
 * Every capability gets a `FakeProvider` driven by a shared `DeviceScript`.
 * The script sets the reported availability, makes session creation or the
 * operation fail, and records what the dispatcher did: sessions created and
 * destroyed, configurations, inputs and response constraints.
 */

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aisylum::builtin::{
    ChatSession, ChatSessionOptions, DeviceRuntime, DeviceSession, DownloadMonitor,
    LanguageDetection, LanguageDetectorSession, LanguagePair, ProofreadResult, ProofreaderOptions,
    ProofreaderSession, RewriterOptions, RewriterSession, SessionProvider, SummarizerOptions,
    SummarizerSession, TranslatorSession, WriterOptions, WriterSession,
};
use aisylum::capability::{AvailabilityState, Capability};
use aisylum::errors::LocalError;

/// Behavior and call record of one fake capability
#[derive(Debug)]
pub struct DeviceScript {
    capability: Capability,
    state: Mutex<AvailabilityState>,
    probe_error: AtomicBool,
    fail_create: AtomicBool,
    fail_operation: AtomicBool,
    fail_stream: AtomicBool,
    create_delay_ms: AtomicU64,
    created: AtomicUsize,
    destroyed: AtomicUsize,
    operations: AtomicUsize,
    configs: Mutex<Vec<String>>,
    inputs: Mutex<Vec<String>>,
    constraints: Mutex<Vec<Option<serde_json::Value>>>,
    answer: Mutex<String>,
    snapshots: Mutex<Vec<String>>,
    detections: Mutex<Vec<LanguageDetection>>,
}

impl DeviceScript {
    pub fn new(capability: Capability, state: AvailabilityState) -> Arc<Self> {
        Arc::new(Self {
            capability,
            state: Mutex::new(state),
            probe_error: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_operation: AtomicBool::new(false),
            fail_stream: AtomicBool::new(false),
            create_delay_ms: AtomicU64::new(0),
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
            operations: AtomicUsize::new(0),
            configs: Mutex::new(Vec::new()),
            inputs: Mutex::new(Vec::new()),
            constraints: Mutex::new(Vec::new()),
            answer: Mutex::new(format!("[LOCAL {}]", capability)),
            snapshots: Mutex::new(Vec::new()),
            detections: Mutex::new(Vec::new()),
        })
    }

    pub fn set_state(&self, state: AvailabilityState) {
        *self.state.lock().unwrap() = state;
    }

    /// Make the availability query itself fail
    pub fn fail_probe(&self) {
        self.probe_error.store(true, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_operation(&self, fail: bool) {
        self.fail_operation.store(fail, Ordering::SeqCst);
    }

    /// Make streamed answers break off after the scripted snapshots
    pub fn fail_stream(&self) {
        self.fail_stream.store(true, Ordering::SeqCst);
    }

    pub fn delay_create(&self, delay_ms: u64) {
        self.create_delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    /// Text returned by every operation
    pub fn answer_with(&self, answer: impl Into<String>) {
        *self.answer.lock().unwrap() = answer.into();
    }

    /// Cumulative snapshots returned by streamed prompts
    pub fn stream_snapshots(&self, snapshots: &[&str]) {
        *self.snapshots.lock().unwrap() = snapshots.iter().map(|s| s.to_string()).collect();
    }

    pub fn detect_as(&self, detections: &[(&str, f32)]) {
        *self.detections.lock().unwrap() = detections
            .iter()
            .map(|(language, confidence)| LanguageDetection {
                detected_language: language.to_string(),
                confidence: *confidence,
            })
            .collect();
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Operations run on sessions, failed ones included
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Configuration labels of created sessions, in creation order
    pub fn configs(&self) -> Vec<String> {
        self.configs.lock().unwrap().clone()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn constraints(&self) -> Vec<Option<serde_json::Value>> {
        self.constraints.lock().unwrap().clone()
    }

    fn availability(&self) -> Result<AvailabilityState, LocalError> {
        if self.probe_error.load(Ordering::SeqCst) {
            return Err(LocalError::operation(self.capability, "availability query failed"));
        }
        Ok(*self.state.lock().unwrap())
    }

    async fn open(self: &Arc<Self>, config: String, monitor: Option<DownloadMonitor>) -> Result<Arc<FakeSession>, LocalError> {
        let delay = self.create_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(LocalError::session_creation(self.capability, "scripted creation failure"));
        }
        if let Some(monitor) = monitor {
            monitor(1.0);
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().unwrap().push(config.clone());
        Ok(Arc::new(FakeSession {
            script: Arc::clone(self),
            config,
        }))
    }

    fn run(&self, input: &str) -> Result<String, LocalError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_string());
        if self.fail_operation.load(Ordering::SeqCst) {
            return Err(LocalError::operation(self.capability, "scripted operation failure"));
        }
        Ok(self.answer.lock().unwrap().clone())
    }
}

/// Session handed out by a `FakeProvider`
#[derive(Debug)]
pub struct FakeSession {
    script: Arc<DeviceScript>,
    config: String,
}

impl FakeSession {
    pub fn config(&self) -> &str {
        &self.config
    }
}

impl DeviceSession for FakeSession {
    fn destroy(&self) {
        self.script.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatSession for FakeSession {
    async fn prompt(&self, input: &str, constraint: Option<&serde_json::Value>) -> Result<String, LocalError> {
        self.script.constraints.lock().unwrap().push(constraint.cloned());
        self.script.run(input)
    }

    async fn prompt_streaming(&self, input: &str) -> Result<BoxStream<'static, Result<String, LocalError>>, LocalError> {
        self.script.run(input)?;
        let mut items: Vec<Result<String, LocalError>> = self
            .script
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        if self.script.fail_stream.load(Ordering::SeqCst) {
            items.push(Err(LocalError::operation(Capability::Prompt, "stream broke off")));
        }
        Ok(stream::iter(items).boxed())
    }
}

#[async_trait]
impl SummarizerSession for FakeSession {
    async fn summarize(&self, text: &str) -> Result<String, LocalError> {
        self.script.run(text)
    }
}

#[async_trait]
impl WriterSession for FakeSession {
    async fn write(&self, prompt: &str) -> Result<String, LocalError> {
        self.script.run(prompt)
    }
}

#[async_trait]
impl RewriterSession for FakeSession {
    async fn rewrite(&self, text: &str) -> Result<String, LocalError> {
        self.script.run(text)
    }
}

#[async_trait]
impl TranslatorSession for FakeSession {
    async fn translate(&self, text: &str) -> Result<String, LocalError> {
        self.script.run(text)
    }
}

#[async_trait]
impl LanguageDetectorSession for FakeSession {
    async fn detect(&self, text: &str) -> Result<Vec<LanguageDetection>, LocalError> {
        self.script.run(text)?;
        Ok(self.script.detections.lock().unwrap().clone())
    }
}

#[async_trait]
impl ProofreaderSession for FakeSession {
    async fn proofread(&self, text: &str) -> Result<ProofreadResult, LocalError> {
        self.script.run(text).map(ProofreadResult::corrected)
    }
}

/// Scripted provider of one capability
#[derive(Debug)]
pub struct FakeProvider<O> {
    script: Arc<DeviceScript>,
    _options: PhantomData<fn(O)>,
}

impl<O> FakeProvider<O> {
    pub fn new(script: Arc<DeviceScript>) -> Self {
        Self {
            script,
            _options: PhantomData,
        }
    }
}

macro_rules! fake_provider {
    ($options:ty, $session:ty, $label:expr) => {
        #[async_trait]
        impl SessionProvider for FakeProvider<$options> {
            type Options = $options;
            type Session = $session;

            fn capability(&self) -> Capability {
                self.script.capability
            }

            async fn availability(&self, _options: &$options) -> Result<AvailabilityState, LocalError> {
                self.script.availability()
            }

            async fn create(&self, options: &$options, monitor: Option<DownloadMonitor>) -> Result<Arc<$session>, LocalError> {
                let label: fn(&$options) -> String = $label;
                let session: Arc<$session> = self.script.open(label(options), monitor).await?;
                Ok(session)
            }
        }
    };
}

fake_provider!(ChatSessionOptions, dyn ChatSession, |options| {
    options.system_prompt.clone().unwrap_or_default()
});
fake_provider!(SummarizerOptions, dyn SummarizerSession, |options| {
    options.session_key().to_string()
});
fake_provider!(WriterOptions, dyn WriterSession, |options| format!("{:?}", options));
fake_provider!(RewriterOptions, dyn RewriterSession, |options| format!("{:?}", options));
fake_provider!(LanguagePair, dyn TranslatorSession, |pair| pair.session_key().to_string());
fake_provider!((), dyn LanguageDetectorSession, |_| "detector".to_string());
fake_provider!(ProofreaderOptions, dyn ProofreaderSession, |options| {
    options.expected_input_languages.join(",")
});

/// One script per capability, assembled into a `DeviceRuntime`
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub prompt: Arc<DeviceScript>,
    pub summarizer: Arc<DeviceScript>,
    pub writer: Arc<DeviceScript>,
    pub rewriter: Arc<DeviceScript>,
    pub translator: Arc<DeviceScript>,
    pub detector: Arc<DeviceScript>,
    pub proofreader: Arc<DeviceScript>,
}

impl FakeDevice {
    /// Every capability reports `state`
    pub fn with_state(state: AvailabilityState) -> Self {
        Self {
            prompt: DeviceScript::new(Capability::Prompt, state),
            summarizer: DeviceScript::new(Capability::Summarizer, state),
            writer: DeviceScript::new(Capability::Writer, state),
            rewriter: DeviceScript::new(Capability::Rewriter, state),
            translator: DeviceScript::new(Capability::Translator, state),
            detector: DeviceScript::new(Capability::LanguageDetector, state),
            proofreader: DeviceScript::new(Capability::Proofreader, state),
        }
    }

    pub fn available() -> Self {
        Self::with_state(AvailabilityState::Available)
    }

    pub fn script(&self, capability: Capability) -> &Arc<DeviceScript> {
        match capability {
            Capability::Prompt => &self.prompt,
            Capability::Summarizer => &self.summarizer,
            Capability::Writer => &self.writer,
            Capability::Rewriter => &self.rewriter,
            Capability::Translator => &self.translator,
            Capability::LanguageDetector => &self.detector,
            Capability::Proofreader => &self.proofreader,
        }
    }

    /// Sessions created across every capability
    pub fn total_created(&self) -> usize {
        Capability::ALL.iter().map(|capability| self.script(*capability).created()).sum()
    }

    pub fn runtime(&self) -> DeviceRuntime {
        DeviceRuntime::unavailable()
            .with_prompt(Arc::new(FakeProvider::<ChatSessionOptions>::new(Arc::clone(&self.prompt))))
            .with_summarizer(Arc::new(FakeProvider::<SummarizerOptions>::new(Arc::clone(&self.summarizer))))
            .with_writer(Arc::new(FakeProvider::<WriterOptions>::new(Arc::clone(&self.writer))))
            .with_rewriter(Arc::new(FakeProvider::<RewriterOptions>::new(Arc::clone(&self.rewriter))))
            .with_translator(Arc::new(FakeProvider::<LanguagePair>::new(Arc::clone(&self.translator))))
            .with_language_detector(Arc::new(FakeProvider::<()>::new(Arc::clone(&self.detector))))
            .with_proofreader(Arc::new(FakeProvider::<ProofreaderOptions>::new(Arc::clone(&self.proofreader))))
    }
}
