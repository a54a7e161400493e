//! Generic endpoint adapter.
//!
//! Sends an OpenAI-shaped body to `config.endpoint` and accepts whichever of
//! the common reply shapes comes back.

use super::{post_json, string_at, ProviderConfig, TreeProvider};
use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Reply fields tried in order; first non-empty string wins.
const CONTENT_POINTERS: [&str; 4] = [
    "/choices/0/message/content",
    "/content/0/text",
    "/response",
    "/text",
];

pub struct CustomProvider {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl CustomProvider {
    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }

    fn request_body(
        question: &str,
        system_prompt: &str,
        config: &ProviderConfig,
    ) -> serde_json::Value {
        json!({
            "model": config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": question},
            ],
            "temperature": config.effective_temperature(),
        })
    }
}

/// Find the text content of a reply of unknown shape.
pub fn resolve_content(body: &serde_json::Value) -> Option<&str> {
    CONTENT_POINTERS
        .iter()
        .find_map(|pointer| string_at(body, pointer))
}

#[async_trait]
impl TreeProvider for CustomProvider {
    fn name(&self) -> &str {
        "custom"
    }

    async fn send(
        &self,
        question: &str,
        system_prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, LlmError> {
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(LlmError::MissingEndpoint);
        }
        debug!("POST {}", endpoint);

        let mut request = self
            .client
            .post(endpoint)
            .json(&Self::request_body(question, system_prompt, config));
        // self-hosted endpoints often run without auth
        if !config.api_key.trim().is_empty() {
            request = request.bearer_auth(&config.api_key);
        }

        let body = post_json(request, self.timeout_secs, "Custom API call failed").await?;

        resolve_content(&body)
            .map(|s| s.to_string())
            .ok_or(LlmError::UnrecognizedResponseShape)
    }
}
