use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::ProxyConfig;
use crate::builtin::{RewriterOptions, SummarizerOptions, WriterOptions};
use crate::errors::ProviderError;

use super::{PromptRequest, RemoteBackend};

/// Client for the remote AI proxy
///
/// The proxy holds the model provider credential; this client only knows its
/// base URL.
#[derive(Debug, Clone)]
pub struct RemoteProxyClient {
    /// HTTP client for API requests
    client: Client,
    /// Base URL the `/api/...` paths are appended to
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SummarizerBody<'a> {
    text: &'a str,
    options: &'a SummarizerOptions,
}

#[derive(Debug, Serialize)]
struct WriterBody<'a> {
    prompt: &'a str,
    options: &'a WriterOptions,
}

#[derive(Debug, Serialize)]
struct RewriterBody<'a> {
    text: &'a str,
    options: &'a RewriterOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslatorBody<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_language: Option<&'a str>,
    target_language: &'a str,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    text: &'a str,
}

/// `{response}` body returned by most endpoints
#[derive(Debug, Deserialize)]
struct TextResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct LanguageResponse {
    language: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// `{error}` body the proxy sends with failures
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl RemoteProxyClient {
    /// Create a new proxy client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an endpoint path such as `/api/prompt`
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint_url(path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            error!("Remote proxy request to {} failed: {}", path, e);
            ProviderError::from(e)
        })?;

        Self::decode(path, response).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ProviderError> {
        let url = self.endpoint_url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("Remote proxy request to {} failed: {}", path, e);
            ProviderError::from(e)
        })?;

        Self::decode(path, response).await
    }

    async fn decode<R: DeserializeOwned>(path: &str, response: Response) -> Result<R, ProviderError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = error_message(&body);
            error!("Remote proxy error on {} ({}): {}", path, status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::ParseError(format!("Unexpected response from {}: {}", path, e))
        })
    }
}

/// Message of an error body: the `error` field when present, the raw text otherwise
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no error message".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl RemoteBackend for RemoteProxyClient {
    async fn prompt(&self, request: &PromptRequest) -> Result<String, ProviderError> {
        let response: TextResponse = self.post("/api/prompt", request).await?;
        Ok(response.response)
    }

    async fn summarize(&self, text: &str, options: &SummarizerOptions) -> Result<String, ProviderError> {
        let response: TextResponse = self
            .post("/api/summarizer", &SummarizerBody { text, options })
            .await?;
        Ok(response.response)
    }

    async fn write(&self, prompt: &str, options: &WriterOptions) -> Result<String, ProviderError> {
        let response: TextResponse = self.post("/api/writer", &WriterBody { prompt, options }).await?;
        Ok(response.response)
    }

    async fn rewrite(&self, text: &str, options: &RewriterOptions) -> Result<String, ProviderError> {
        let response: TextResponse = self.post("/api/rewriter", &RewriterBody { text, options }).await?;
        Ok(response.response)
    }

    async fn translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let body = TranslatorBody {
            text,
            source_language,
            target_language,
        };
        let response: TextResponse = self.post("/api/translator", &body).await?;
        Ok(response.response)
    }

    async fn detect_language(&self, text: &str) -> Result<String, ProviderError> {
        let response: LanguageResponse = self.post("/api/language-detector", &TextBody { text }).await?;
        Ok(response.language.trim().to_string())
    }

    async fn proofread(&self, text: &str) -> Result<String, ProviderError> {
        let response: TextResponse = self.post("/api/proofreader", &TextBody { text }).await?;
        Ok(response.response)
    }

    async fn health(&self) -> Result<(), ProviderError> {
        let response: HealthResponse = self.get("/api/health").await?;
        if response.status == "ok" {
            Ok(())
        } else {
            Err(ProviderError::ApiError {
                status_code: 200,
                message: format!("Proxy reported status '{}'", response.status),
            })
        }
    }
}
