/*!
 * Configuration and result types shared by on-device sessions and the remote proxy.
 *
 * The serde representation of each option type is the proxy wire format, so
 * the same value configures a local session and a remote request.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::SessionKey;

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Initial state of a conversational session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
}

impl ChatSessionOptions {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(system_prompt.into()),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Messages a fresh session starts from: system prompt first, then history
    pub fn initial_prompts(&self) -> Vec<ChatMessage> {
        self.system_prompt
            .iter()
            .map(|prompt| ChatMessage::system(prompt.clone()))
            .chain(self.history.iter().cloned())
            .collect()
    }
}

/// Kind of summary produced by a summarizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SummaryType {
    #[serde(rename = "key-points")]
    KeyPoints,
    #[default]
    #[serde(rename = "tl;dr")]
    Tldr,
    #[serde(rename = "teaser")]
    Teaser,
    #[serde(rename = "headline")]
    Headline,
}

/// Output format of generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextFormat {
    #[default]
    PlainText,
    Markdown,
}

/// Target length of generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SummarizerOptions {
    #[serde(rename = "type")]
    pub summary_type: SummaryType,
    pub format: TextFormat,
    pub length: TextLength,
}

impl SummarizerOptions {
    pub fn new(summary_type: SummaryType, length: TextLength) -> Self {
        Self {
            summary_type,
            format: TextFormat::default(),
            length,
        }
    }

    /// Options used for conversation titles
    pub fn headline() -> Self {
        Self::new(SummaryType::Headline, TextLength::Short)
    }

    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(format!(
            "{}/{}/{}",
            enum_label(&self.summary_type),
            enum_label(&self.format),
            enum_label(&self.length)
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriterTone {
    Formal,
    #[default]
    Neutral,
    Casual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WriterOptions {
    pub tone: WriterTone,
    pub format: TextFormat,
    pub length: TextLength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RewriterTone {
    #[default]
    AsIs,
    MoreFormal,
    MoreCasual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RewriterFormat {
    #[default]
    AsIs,
    PlainText,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RewriterLength {
    #[default]
    AsIs,
    Shorter,
    Longer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RewriterOptions {
    pub tone: RewriterTone,
    pub format: RewriterFormat,
    pub length: RewriterLength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_context: Option<String>,
    /// Language the rewritten text should be in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl RewriterOptions {
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofreaderOptions {
    pub expected_input_languages: Vec<String>,
}

impl Default for ProofreaderOptions {
    fn default() -> Self {
        Self {
            expected_input_languages: vec!["en".to_string()],
        }
    }
}

/// Source and target language of a translator session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePair {
    pub source_language: String,
    pub target_language: String,
}

impl LanguagePair {
    pub fn new(source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(format!("{}-{}", self.source_language, self.target_language))
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_language, self.target_language)
    }
}

/// One candidate reported by a language detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDetection {
    pub detected_language: String,
    pub confidence: f32,
}

/// A single correction reported by a proofreader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub correction: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofreadResult {
    pub corrected_input: String,
    #[serde(default)]
    pub corrections: Vec<Correction>,
}

impl ProofreadResult {
    /// Result carrying only the corrected text, as the remote proxy returns it
    pub fn corrected(corrected_input: impl Into<String>) -> Self {
        Self {
            corrected_input: corrected_input.into(),
            corrections: Vec::new(),
        }
    }
}

/// Serialized label of a unit enum variant, e.g. `tl;dr`
pub(crate) fn enum_label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(label)) => label,
        _ => String::new(),
    }
}
