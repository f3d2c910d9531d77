use log::{debug, error};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::builtin::ChatMessage;
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// `"json"` or a JSON schema the response must follow
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// `"json"` or a JSON schema the response must follow
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model name
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

/// A model installed in the daemon
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

/// One line of the NDJSON progress stream of `/api/pull`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PullStatus {
    /// Download fraction of the current layer, when the daemon reports one
    pub fn fraction(&self) -> Option<f64> {
        match (self.completed, self.total) {
            (Some(completed), Some(total)) if total > 0 => {
                Some((completed as f64 / total as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

impl GenerationOptions {
    pub fn temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            num_predict: None,
        }
    }
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            format: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Constrain the output to a JSON schema
    pub fn format(mut self, format: serde_json::Value) -> Self {
        self.format = Some(format);
        self
    }
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            format: None,
            stream: false,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Constrain the output to a JSON schema
    pub fn format(mut self, format: serde_json::Value) -> Self {
        self.format = Some(format);
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a complete URL
    pub fn from_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: url.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                // Ollama uses HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let text = Self::success_text(response).await?;

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}", e, preview(&text));
            ProviderError::ParseError(format!("Invalid generate response: {}", e))
        })
    }

    /// Chat with the Ollama API
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let text = Self::success_text(response).await?;

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse Ollama API chat response: {}. Raw response (first 500 chars): {}", e, preview(&text));
            ProviderError::ParseError(format!("Invalid chat response: {}", e))
        })
    }

    /// Models installed in the daemon
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        let text = Self::success_text(response).await?;

        let tags: TagsResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::ParseError(format!("Invalid tags response: {}", e)))?;
        Ok(tags.models)
    }

    /// Whether `model` is installed; a tag-less name matches any tag
    pub async fn has_model(&self, model: &str) -> Result<bool, ProviderError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|installed| model_matches(&installed.name, model)))
    }

    /// Download `model`, reporting every progress line to `on_progress`
    pub async fn pull<F>(&self, model: &str, mut on_progress: F) -> Result<(), ProviderError>
    where
        F: FnMut(&PullStatus) + Send,
    {
        let url = format!("{}/api/pull", self.base_url);
        debug!("Pulling model {} from {}", model, self.base_url);

        let mut response = self
            .client
            .post(&url)
            .json(&PullRequest { model, stream: true })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let mut buffer: Vec<u8> = Vec::new();
        let mut succeeded = false;
        while let Some(chunk) = response.chunk().await? {
            buffer.extend_from_slice(&chunk);
            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                succeeded |= Self::handle_pull_line(&line, &mut on_progress)?;
            }
        }
        if !buffer.is_empty() {
            succeeded |= Self::handle_pull_line(&buffer, &mut on_progress)?;
        }

        if succeeded {
            Ok(())
        } else {
            Err(ProviderError::RequestFailed(format!(
                "Pull of {} ended without success",
                model
            )))
        }
    }

    fn handle_pull_line<F>(line: &[u8], on_progress: &mut F) -> Result<bool, ProviderError>
    where
        F: FnMut(&PullStatus),
    {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return Ok(false);
        }

        let status: PullStatus = serde_json::from_str(line)
            .map_err(|e| ProviderError::ParseError(format!("Invalid pull progress line: {}", e)))?;
        if let Some(message) = &status.error {
            return Err(ProviderError::RequestFailed(message.clone()));
        }

        on_progress(&status);
        Ok(status.is_success())
    }

    async fn success_text(response: Response) -> Result<String, ProviderError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to get response text from Ollama API: {}", e)))?;

        if !status.is_success() {
            error!("Ollama API error ({}): {}", status, text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }
}

/// Whether an installed model name satisfies a requested one
pub fn model_matches(installed: &str, requested: &str) -> bool {
    if installed == requested {
        return true;
    }
    match installed.split_once(':') {
        Some((base, tag)) => !requested.contains(':') && base == requested && tag == "latest",
        None => false,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(500).collect()
}
