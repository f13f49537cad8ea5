use anyhow::Result;
use std::env;
use std::time::Duration;

/// Settings for the OpenAI-compatible completion service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = env::var("LLM_API_KEY").ok().filter(|key| !key.is_empty());
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let timeout_secs: u64 = env::var("LLM_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()?;

        Ok(LlmConfig {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
