/*!
 * Capability identifiers and availability states.
 */

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An AI capability that may be served on-device or by the remote proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Prompt,
    Summarizer,
    Writer,
    Rewriter,
    Translator,
    LanguageDetector,
    Proofreader,
}

impl Capability {
    /// Every capability, in probing order
    pub const ALL: [Capability; 7] = [
        Capability::Prompt,
        Capability::Summarizer,
        Capability::Writer,
        Capability::Rewriter,
        Capability::Translator,
        Capability::LanguageDetector,
        Capability::Proofreader,
    ];

    /// Name of the on-device API implementing this capability
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Prompt => "LanguageModel",
            Self::Summarizer => "Summarizer",
            Self::Writer => "Writer",
            Self::Rewriter => "Rewriter",
            Self::Translator => "Translator",
            Self::LanguageDetector => "LanguageDetector",
            Self::Proofreader => "Proofreader",
        }
    }

    /// Remote proxy endpoint serving the same operation
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Prompt => "/api/prompt",
            Self::Summarizer => "/api/summarizer",
            Self::Writer => "/api/writer",
            Self::Rewriter => "/api/rewriter",
            Self::Translator => "/api/translator",
            Self::LanguageDetector => "/api/language-detector",
            Self::Proofreader => "/api/proofreader",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Summarizer => "summarizer",
            Self::Writer => "writer",
            Self::Rewriter => "rewriter",
            Self::Translator => "translator",
            Self::LanguageDetector => "language-detector",
            Self::Proofreader => "proofreader",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted || c.api_name().to_lowercase() == wanted)
            .ok_or_else(|| anyhow!("Invalid capability: {}", s))
    }
}

/// Readiness of an on-device capability
///
/// Queried on every use and never cached: a model can finish downloading
/// between two calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityState {
    #[default]
    Unavailable,
    Downloadable,
    Downloading,
    Available,
}

impl AvailabilityState {
    /// Only `Available` allows an on-device attempt
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Downloadable => "downloadable",
            Self::Downloading => "downloading",
            Self::Available => "available",
        }
    }
}

impl fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AvailabilityState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unavailable" | "no" => Ok(Self::Unavailable),
            "downloadable" | "after-download" => Ok(Self::Downloadable),
            "downloading" => Ok(Self::Downloading),
            "available" | "readily" => Ok(Self::Available),
            _ => Err(anyhow!("Invalid availability state: {}", s)),
        }
    }
}
