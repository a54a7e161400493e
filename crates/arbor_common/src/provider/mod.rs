//! Provider abstraction.
//!
//! Each backend turns a question plus system prompt into one HTTP call and
//! returns the raw text content of the reply. JSON extraction and tree
//! parsing happen in the engine, so every adapter has the same contract.

mod anthropic;
mod custom;
mod fake;
mod openai;

pub use anthropic::AnthropicProvider;
pub use custom::{resolve_content, CustomProvider};
pub use fake::FakeProvider;
pub use openai::OpenAiProvider;

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Temperature used when the configured one is zero or not a number.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default HTTP timeout for provider calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Named backend selected by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderKind {
    #[default]
    Mock,
    OpenAi,
    Anthropic,
    Custom,
    /// A name with no adapter. Kept so the engine can fall back instead of
    /// failing to parse the request.
    Unsupported(String),
}

impl ProviderKind {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Custom => "custom",
            ProviderKind::Unsupported(name) => name,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, ProviderKind::Mock)
    }
}

impl From<String> for ProviderKind {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "mock" => ProviderKind::Mock,
            "openai" => ProviderKind::OpenAi,
            "anthropic" => ProviderKind::Anthropic,
            "custom" => ProviderKind::Custom,
            _ => ProviderKind::Unsupported(name),
        }
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call provider settings. Supplied by the caller; the engine never
/// caches or mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    #[serde(alias = "api_key")]
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub temperature: f64,
    /// Persistence flag for the config store; ignored by the engine.
    #[serde(alias = "save_to_local")]
    pub save_to_local: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            api_key: String::new(),
            model: "gpt-4".to_string(),
            endpoint: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            save_to_local: true,
        }
    }
}

impl ProviderConfig {
    pub fn mock() -> Self {
        Self::default()
    }

    /// Temperature sent on the wire. Zero counts as unset.
    pub fn effective_temperature(&self) -> f64 {
        if self.temperature == 0.0 || !self.temperature.is_finite() {
            DEFAULT_TEMPERATURE
        } else {
            self.temperature
        }
    }

    /// Configured model, or `fallback` when empty.
    pub fn model_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.model.trim().is_empty() {
            fallback
        } else {
            &self.model
        }
    }

    pub(crate) fn require_api_key(&self) -> Result<&str, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::ProviderAuth {
                message: format!("{} requires an API key", self.provider),
            });
        }
        Ok(&self.api_key)
    }
}

/// One backend. Exactly one outbound call per `send`, no retries.
#[async_trait]
pub trait TreeProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Send the question and return the reply's text content.
    async fn send(
        &self,
        question: &str,
        system_prompt: &str,
        config: &ProviderConfig,
    ) -> Result<String, LlmError>;
}

/// Build the shared HTTP client used by the adapters.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Adapter lookup by [`ProviderKind`].
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn TreeProvider>>,
}

impl ProviderRegistry {
    /// Registry with no adapters. Every live lookup fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The three HTTP adapters sharing `client`.
    pub fn http(client: reqwest::Client, timeout_secs: u64) -> Self {
        let mut registry = Self::empty();
        registry.register(
            ProviderKind::OpenAi,
            Arc::new(OpenAiProvider::new(client.clone(), timeout_secs)),
        );
        registry.register(
            ProviderKind::Anthropic,
            Arc::new(AnthropicProvider::new(client.clone(), timeout_secs)),
        );
        registry.register(
            ProviderKind::Custom,
            Arc::new(CustomProvider::new(client, timeout_secs)),
        );
        registry
    }

    /// Replace (or add) the adapter for `kind`.
    pub fn register(&mut self, kind: ProviderKind, provider: Arc<dyn TreeProvider>) {
        self.providers.insert(kind, provider);
    }

    pub fn get(&self, kind: &ProviderKind) -> Result<Arc<dyn TreeProvider>, LlmError> {
        self.providers
            .get(kind)
            .cloned()
            .ok_or_else(|| LlmError::UnsupportedProvider(kind.to_string()))
    }

    pub fn kinds(&self) -> Vec<&ProviderKind> {
        let mut kinds: Vec<_> = self.providers.keys().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.kinds())
            .finish()
    }
}

/// Send a prepared request and return the JSON body of a 2xx reply.
///
/// Non-2xx replies become `ProviderAuth` (401/403) or `ProviderHttp`, using the
/// provider's `error.message` when the body has one.
pub(crate) async fn post_json(
    request: reqwest::RequestBuilder,
    timeout_secs: u64,
    fallback_message: &str,
) -> Result<serde_json::Value, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::from_transport(e, timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| fallback_message.to_string());
        return Err(match status.as_u16() {
            401 | 403 => LlmError::ProviderAuth { message },
            code => LlmError::ProviderHttp {
                status: code,
                message,
            },
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| LlmError::from_transport(e, timeout_secs))?;
    serde_json::from_str(&body)
        .map_err(|e| LlmError::MalformedResponse(format!("Reply body is not JSON: {}", e)))
}

/// `error.message` from an error body, if present.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Non-empty string at `pointer`.
pub(crate) fn string_at<'a>(value: &'a serde_json::Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}
