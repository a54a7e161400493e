//! Anthropic messages adapter.
//!
//! The system prompt travels in its own `system` field and the reply text is
//! not guaranteed to be bare JSON.

use super::{post_json, string_at, ProviderConfig, TreeProvider};
use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self::with_base_url(client, ANTHROPIC_BASE_URL, timeout_secs)
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    fn request_body(
        question: &str,
        system_prompt: &str,
        config: &ProviderConfig,
    ) -> serde_json::Value {
        json!({
            "model": config.model_or(ANTHROPIC_DEFAULT_MODEL),
            "max_tokens": MAX_TOKENS,
            "temperature": config.effective_temperature(),
            "system": system_prompt,
            "messages": [
                {"role": "user", "content": question},
            ],
        })
    }
}

#[async_trait]
impl TreeProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn send(
        &self,
        question: &str,
        system_prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, LlmError> {
        let api_key = config.require_api_key()?;
        let url = format!("{}/messages", self.base_url);
        debug!("POST {}", url);

        let request = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::request_body(question, system_prompt, config));

        let body = post_json(request, self.timeout_secs, "Anthropic API call failed").await?;

        string_at(&body, "/content/0/text")
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::MalformedResponse("missing content[0].text".to_string()))
    }
}
