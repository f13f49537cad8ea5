use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::{GenerationConfig, LlmConfig};
use crate::errors::GenerationError;

/// Per-request generation settings
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the service for JSON-shaped output when it supports it
    pub json_response: bool,
    pub system_prompt: Option<String>,
}

impl CompletionOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            json_response: config.json_mode,
            system_prompt: Some(config.system_prompt.clone()).filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw text returned by the completion service
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    /// The service stopped because it reached the output token cap
    pub truncated: bool,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            truncated: false,
            usage: None,
        }
    }

    pub fn truncated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            truncated: true,
            usage: None,
        }
    }
}

/// Text-completion service: prompt in, text or error out
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Client for any service speaking the OpenAI chat completions format
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn is_truncation(finish_reason: Option<&str>) -> bool {
        matches!(finish_reason, Some("length") | Some("max_tokens") | Some("MAX_TOKENS"))
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, GenerationError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt.as_deref() {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
            response_format: options
                .json_response
                .then_some(ResponseFormat { format_type: "json_object" }),
        };

        debug!("Sending completion request to {} ({} prompt chars)", self.model, prompt.len());

        let mut http_request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|e| {
            error!("Completion request failed: {}", e);
            GenerationError::Upstream(format!("request failed: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GenerationError::Upstream(format!("failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            error!("Completion service returned {}: {}", status, body);
            return Err(GenerationError::Upstream(format!(
                "completion service returned {}",
                status
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::Upstream(format!("unreadable completion envelope: {}", e))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Upstream("completion returned no choices".to_string()))?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError::Upstream("completion returned no text".to_string()));
        }

        let truncated = Self::is_truncation(choice.finish_reason.as_deref());
        if truncated {
            warn!(
                "Completion hit the output token cap ({} tokens)",
                options.max_output_tokens
            );
        }

        let usage = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        debug!(
            "Received {} chars, finish_reason: {:?}, usage: {:?}",
            text.len(),
            choice.finish_reason,
            usage
        );

        Ok(Completion {
            text,
            truncated,
            usage,
        })
    }
}
