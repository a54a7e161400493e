//! OpenAI chat-completions adapter.

use super::{post_json, string_at, ProviderConfig, TreeProvider};
use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4";

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self::with_base_url(client, OPENAI_BASE_URL, timeout_secs)
    }

    /// Point the adapter at an OpenAI-compatible gateway.
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(
        question: &str,
        system_prompt: &str,
        config: &ProviderConfig,
    ) -> serde_json::Value {
        json!({
            "model": config.model_or(OPENAI_DEFAULT_MODEL),
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": question},
            ],
            "temperature": config.effective_temperature(),
            "response_format": {"type": "json_object"},
        })
    }
}

#[async_trait]
impl TreeProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn send(
        &self,
        question: &str,
        system_prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, LlmError> {
        let api_key = config.require_api_key()?;
        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {}", url);

        let request = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&Self::request_body(question, system_prompt, config));

        let body = post_json(request, self.timeout_secs, "OpenAI API call failed").await?;

        string_at(&body, "/choices/0/message/content")
            .map(|s| s.to_string())
            .ok_or_else(|| {
                LlmError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }
}
