use log::{debug, warn};
use std::sync::Arc;

use crate::capability::{AvailabilityState, Capability};

use super::{
    ChatSessionOptions, DeviceRuntime, LanguagePair, ProofreaderOptions, RewriterOptions,
    SummarizerOptions, WriterOptions,
};

/// Reports whether an on-device capability can be used right now
///
/// Results are never cached. Provider errors are reported as `Unavailable`,
/// so probing never fails.
#[derive(Debug, Clone)]
pub struct AvailabilityProber {
    device: Arc<DeviceRuntime>,
}

impl AvailabilityProber {
    pub fn new(device: Arc<DeviceRuntime>) -> Self {
        Self { device }
    }

    /// Probe a capability with its default configuration
    ///
    /// The translator needs the language pair it would translate.
    pub async fn check_availability(
        &self,
        capability: Capability,
        pair: Option<&LanguagePair>,
    ) -> AvailabilityState {
        let result = match capability {
            Capability::Prompt => {
                self.device
                    .prompt
                    .availability(&ChatSessionOptions::default())
                    .await
            }
            Capability::Summarizer => {
                self.device
                    .summarizer
                    .availability(&SummarizerOptions::default())
                    .await
            }
            Capability::Writer => self.device.writer.availability(&WriterOptions::default()).await,
            Capability::Rewriter => {
                self.device
                    .rewriter
                    .availability(&RewriterOptions::default())
                    .await
            }
            Capability::Translator => match pair {
                Some(pair) => self.device.translator.availability(pair).await,
                None => {
                    debug!("Translator availability needs a language pair");
                    return AvailabilityState::Unavailable;
                }
            },
            Capability::LanguageDetector => self.device.language_detector.availability(&()).await,
            Capability::Proofreader => {
                self.device
                    .proofreader
                    .availability(&ProofreaderOptions::default())
                    .await
            }
        };

        match result {
            Ok(state) => {
                debug!("On-device {} availability: {}", capability, state);
                state
            }
            Err(e) => {
                warn!("Probing on-device {} failed: {}", capability, e);
                AvailabilityState::Unavailable
            }
        }
    }

    /// Probe every capability, in `Capability::ALL` order
    pub async fn check_all(&self, pair: Option<&LanguagePair>) -> Vec<(Capability, AvailabilityState)> {
        let mut states = Vec::with_capacity(Capability::ALL.len());
        for capability in Capability::ALL {
            states.push((capability, self.check_availability(capability, pair).await));
        }
        states
    }
}
