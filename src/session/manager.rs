/*!
 * Session manager for on-device session lifecycle.
 *
 * This module handles:
 * - One registry per cached capability (chat, lesson tutor, summarizer,
 *   translator, language detector)
 * - The optional download progress monitor handed to session factories
 * - Cleanup of every live session on `dispose`
 */

use log::{debug, info};
use parking_lot::RwLock;

use crate::builtin::{
    ChatSession, DeviceSession, DownloadMonitor, LanguageDetectorSession, SummarizerSession,
    TranslatorSession,
};
use crate::capability::Capability;

use super::{SessionKey, SessionRegistry};

/// Owner of every cached on-device session
///
/// Constructed once by the application root and shared by reference. Writer,
/// rewriter and proofreader sessions are one-shot and never cached here.
pub struct SessionManager {
    chats: SessionRegistry<dyn ChatSession>,
    tutors: SessionRegistry<dyn ChatSession>,
    summarizers: SessionRegistry<dyn SummarizerSession>,
    translators: SessionRegistry<dyn TranslatorSession>,
    detectors: SessionRegistry<dyn LanguageDetectorSession>,
    monitor: RwLock<Option<DownloadMonitor>>,
}

impl SessionManager {
    /// Create an empty manager
    pub fn init() -> Self {
        Self {
            chats: SessionRegistry::new(Capability::Prompt),
            tutors: SessionRegistry::new(Capability::Prompt),
            summarizers: SessionRegistry::new(Capability::Summarizer),
            translators: SessionRegistry::new(Capability::Translator),
            detectors: SessionRegistry::new(Capability::LanguageDetector),
            monitor: RwLock::new(None),
        }
    }

    /// Conversational sessions, keyed by `SessionKey::chat`
    pub fn chats(&self) -> &SessionRegistry<dyn ChatSession> {
        &self.chats
    }

    /// Lesson tutor sessions, keyed by language code
    pub fn tutors(&self) -> &SessionRegistry<dyn ChatSession> {
        &self.tutors
    }

    pub fn summarizers(&self) -> &SessionRegistry<dyn SummarizerSession> {
        &self.summarizers
    }

    /// Translator sessions, keyed by `source-target`
    pub fn translators(&self) -> &SessionRegistry<dyn TranslatorSession> {
        &self.translators
    }

    pub fn detectors(&self) -> &SessionRegistry<dyn LanguageDetectorSession> {
        &self.detectors
    }

    /// Key of the single language detector session
    pub fn detector_key() -> SessionKey {
        SessionKey::new("default")
    }

    /// Install a callback receiving model download progress
    pub fn set_download_monitor(&self, monitor: Option<DownloadMonitor>) {
        *self.monitor.write() = monitor;
    }

    pub fn download_monitor(&self) -> Option<DownloadMonitor> {
        self.monitor.read().clone()
    }

    /// Report progress to the monitor, if one is installed
    pub fn report_progress(&self, progress: f64) {
        if let Some(monitor) = self.monitor.read().as_ref() {
            monitor(progress);
        }
    }

    /// Destroy the conversational session of a chat; no-op when it has none
    pub fn remove_chat_session(&self, chat_id: u64) -> bool {
        self.chats.remove(&SessionKey::chat(chat_id))
    }

    /// Destroy one cached session of a capability
    ///
    /// Capabilities without a cache, and unknown keys, are a no-op.
    pub fn remove_session(&self, capability: Capability, key: &SessionKey) -> bool {
        match capability {
            Capability::Prompt => self.chats.remove(key) | self.tutors.remove(key),
            Capability::Summarizer => self.summarizers.remove(key),
            Capability::Translator => self.translators.remove(key),
            Capability::LanguageDetector => self.detectors.remove(key),
            Capability::Writer | Capability::Rewriter | Capability::Proofreader => {
                debug!("{} sessions are not cached, nothing to remove", capability);
                false
            }
        }
    }

    /// Destroy every cached session of a capability; returns how many were destroyed
    pub fn clear(&self, capability: Capability) -> usize {
        match capability {
            Capability::Prompt => self.chats.clear() + self.tutors.clear(),
            Capability::Summarizer => self.summarizers.clear(),
            Capability::Translator => self.translators.clear(),
            Capability::LanguageDetector => self.detectors.clear(),
            Capability::Writer | Capability::Rewriter | Capability::Proofreader => 0,
        }
    }

    /// Number of live cached sessions across all capabilities
    pub fn live_sessions(&self) -> usize {
        self.chats.len()
            + self.tutors.len()
            + self.summarizers.len()
            + self.translators.len()
            + self.detectors.len()
    }

    /// Destroy every cached session
    pub fn dispose(&self) -> usize {
        let destroyed: usize = Capability::ALL
            .iter()
            .map(|capability| self.clear(*capability))
            .sum();
        if destroyed > 0 {
            info!("Released {} on-device session(s)", destroyed);
        }
        destroyed
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("chats", &self.chats)
            .field("tutors", &self.tutors)
            .field("summarizers", &self.summarizers)
            .field("translators", &self.translators)
            .field("detectors", &self.detectors)
            .field("monitor", &self.monitor.read().is_some())
            .finish()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::init()
    }
}

/// Destroy a one-shot session once its single operation has run
pub(crate) fn release<S: ?Sized + DeviceSession>(capability: Capability, session: &S) {
    debug!("Destroying one-shot {} session", capability);
    session.destroy();
}
