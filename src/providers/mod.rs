/*!
 * Clients for the services behind the on-device tier.
 *
 * - `remote`: client of the remote AI proxy (the fallback tier)
 * - `ollama`: client of a local Ollama daemon, used by the local-model runtime
 * - `mock`: scripted remote backend for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::builtin::{ChatMessage, RewriterOptions, SummarizerOptions, WriterOptions};
use crate::errors::ProviderError;

/// Body of a remote prompt request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub prompt: String,
    /// Earlier turns of the conversation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// The remote tier: one method per proxy endpoint
///
/// Implementations report every failure as a `ProviderError`; there is no
/// tier behind this one, so nothing here falls back.
#[async_trait]
pub trait RemoteBackend: Send + Sync + Debug {
    /// `POST /api/prompt`
    async fn prompt(&self, request: &PromptRequest) -> Result<String, ProviderError>;

    /// `POST /api/summarizer`
    async fn summarize(&self, text: &str, options: &SummarizerOptions) -> Result<String, ProviderError>;

    /// `POST /api/writer`
    async fn write(&self, prompt: &str, options: &WriterOptions) -> Result<String, ProviderError>;

    /// `POST /api/rewriter`
    async fn rewrite(&self, text: &str, options: &RewriterOptions) -> Result<String, ProviderError>;

    /// `POST /api/translator`; the proxy infers the source language when it is `None`
    async fn translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// `POST /api/language-detector`; returns the language as the proxy names it
    async fn detect_language(&self, text: &str) -> Result<String, ProviderError>;

    /// `POST /api/proofreader`; returns the corrected text
    async fn proofread(&self, text: &str) -> Result<String, ProviderError>;

    /// `GET /api/health`
    async fn health(&self) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod ollama;
pub mod remote;

pub use remote::RemoteProxyClient;
