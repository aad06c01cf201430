// llm-client-rs/src/llm_client.rs
//
// HTTP Client for the Anthropic Messages API
//
// This module provides:
// - The `ModelClient` seam the gateway depends on
// - Real HTTP calls to the provider via reqwest
// - Classification of provider failures, keeping the provider's own message
//
// Configuration comes from config_rs::ModelSettings (ANTHROPIC_* variables).
// Calls are made exactly once: a failed call is reported, never retried here.

use async_trait::async_trait;
use config_rs::ModelSettings;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// API version header value expected by the Messages endpoint
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub(crate) struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Provider error body: {"type": "error", "error": {"type": "...", "message": "..."}}
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

// Custom error type for model client operations
// Each variant carries the provider's message when one was returned
#[derive(Debug, Clone, PartialEq)]
pub enum LLMError {
    InvalidRequest(String),    // 400, 401, 403, 404, or a missing API key
    RateLimitExceeded(String), // 429
    ServerError(String),       // 5xx, including 529 overloaded
    NetworkError(String),      // Connection issues, timeouts
    ParseError(String),        // Provider answered 2xx with an unusable body
    UnknownError(String),      // Any other status
}

impl std::fmt::Display for LLMError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            LLMError::RateLimitExceeded(msg) => write!(f, "Rate limit exceeded: {}", msg),
            LLMError::ServerError(msg) => write!(f, "Server error: {}", msg),
            LLMError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LLMError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LLMError::UnknownError(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for LLMError {}

impl LLMError {
    /// The provider's message (or our own description) without the category prefix
    pub fn message(&self) -> &str {
        match self {
            LLMError::InvalidRequest(msg)
            | LLMError::RateLimitExceeded(msg)
            | LLMError::ServerError(msg)
            | LLMError::NetworkError(msg)
            | LLMError::ParseError(msg)
            | LLMError::UnknownError(msg) => msg,
        }
    }
}

/// The model-call seam: one system prompt plus one user message in, raw text out
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LLMError>;

    /// Whether the client has what it needs to make calls
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Creates a new client from settings. A missing API key is logged here
    /// and reported on every call rather than failing construction.
    pub fn new(settings: &ModelSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();

        if settings.api_key.is_none() {
            log::warn!("ANTHROPIC_API_KEY is not set; model calls will fail");
        }
        log::info!(
            "Model client initialized for {} (model: {}, max_tokens: {})",
            settings.api_url,
            settings.model,
            settings.max_tokens
        );

        Self {
            client,
            api_key: settings.api_key.clone(),
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn build_request(&self, system_prompt: &str, user_message: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            system: system_prompt.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: user_message.to_string(),
            }],
            max_tokens: self.max_tokens,
        }
    }

    // Execute a single request attempt
    async fn execute_request(&self, request_body: &MessagesRequest) -> Result<String, LLMError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LLMError::InvalidRequest("API key is not set".to_string()))?;

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LLMError::NetworkError(format!("Request timed out: {}", err))
                } else if err.is_connect() {
                    LLMError::NetworkError(format!("Connection failed: {}", err))
                } else {
                    LLMError::NetworkError(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = classify_status(status, &text);
            log::error!("API Error ({}): {}", status, text);
            return Err(err);
        }

        let data: MessagesResponse = response
            .json()
            .await
            .map_err(|err| LLMError::ParseError(format!("Failed to parse response: {}", err)))?;

        extract_text(data)
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LLMError> {
        let request_body = self.build_request(system_prompt, user_message);

        log::info!(
            "Preparing model request to {} (model: {}, system prompt length: {})",
            self.api_url,
            self.model,
            system_prompt.len()
        );

        self.execute_request(&request_body).await
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Map a non-success status and its body to an error, preferring the
/// provider's `error.message` over the raw body
pub(crate) fn classify_status(status: StatusCode, body: &str) -> LLMError {
    let message = provider_message(body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            "API call failed".to_string()
        } else {
            body.trim().to_string()
        }
    });

    match status.as_u16() {
        400 | 401 | 403 | 404 | 413 => LLMError::InvalidRequest(message),
        429 => LLMError::RateLimitExceeded(message),
        500..=599 => LLMError::ServerError(message),
        _ => LLMError::UnknownError(format!("({}) {}", status, message)),
    }
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .filter(|m| !m.is_empty())
}

/// Text of the first `text` content block
pub(crate) fn extract_text(data: MessagesResponse) -> Result<String, LLMError> {
    if let Some(usage) = &data.usage {
        log::info!(
            "Model request completed. Used {} input and {} output tokens",
            usage.input_tokens,
            usage.output_tokens
        );
    }

    data.content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| LLMError::ParseError("No text content returned in response".to_string()))
}
