//! Daemon settings for arbord.
//!
//! Loads from `$ARBORD_CONFIG` or /etc/arbor/arbord.toml, falling back to
//! defaults when neither is readable.

use anyhow::Result;
use arbor_common::provider::{
    build_client, AnthropicProvider, OpenAiProvider, DEFAULT_TIMEOUT_SECS,
};
use arbor_common::{Engine, EngineSettings, ProviderKind, ProviderRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// System-wide settings path
pub const SETTINGS_PATH: &str = "/etc/arbor/arbord.toml";

/// Environment override for the settings path
pub const SETTINGS_ENV: &str = "ARBORD_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Simulated latency for demo-mode answers
    #[serde(default = "default_mock_delay")]
    pub mock_delay_ms: u64,

    /// Simulated latency for fallback answers after a provider failure
    #[serde(default = "default_fallback_delay")]
    pub fallback_delay_ms: u64,

    /// Per-request timeout for provider calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// OpenAI-compatible gateway instead of api.openai.com
    #[serde(default)]
    pub openai_base_url: Option<String>,

    /// Anthropic-compatible gateway instead of api.anthropic.com
    #[serde(default)]
    pub anthropic_base_url: Option<String>,
}

fn default_listen() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_mock_delay() -> u64 {
    1500
}

fn default_fallback_delay() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            mock_delay_ms: default_mock_delay(),
            fallback_delay_ms: default_fallback_delay(),
            request_timeout_secs: default_request_timeout(),
            openai_base_url: None,
            anthropic_base_url: None,
        }
    }
}

impl ServerSettings {
    /// Load settings from file, or return defaults
    pub fn load() -> Self {
        let path = std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SETTINGS_PATH));

        Self::load_from_path(&path).unwrap_or_else(|e| {
            warn!("Settings not loaded from {}, using defaults: {}", path.display(), e);
            ServerSettings::default()
        })
    }

    pub fn load_from_path(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: ServerSettings = toml::from_str(&content)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            mock_delay: Duration::from_millis(self.mock_delay_ms),
            fallback_delay: Duration::from_millis(self.fallback_delay_ms),
        }
    }

    /// Provider registry with any configured gateway overrides applied.
    pub fn provider_registry(&self) -> Result<ProviderRegistry> {
        let timeout = self.request_timeout_secs;
        let client = build_client(timeout)?;
        let mut registry = ProviderRegistry::http(client.clone(), timeout);

        if let Some(url) = &self.openai_base_url {
            info!("OpenAI requests go to {}", url);
            registry.register(
                ProviderKind::OpenAi,
                Arc::new(OpenAiProvider::with_base_url(client.clone(), url, timeout)),
            );
        }
        if let Some(url) = &self.anthropic_base_url {
            info!("Anthropic requests go to {}", url);
            registry.register(
                ProviderKind::Anthropic,
                Arc::new(AnthropicProvider::with_base_url(client, url, timeout)),
            );
        }
        Ok(registry)
    }

    pub fn build_engine(&self) -> Result<Engine> {
        Ok(Engine::new(self.provider_registry()?, self.engine_settings()))
    }
}
