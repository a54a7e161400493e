//! Generation orchestrator.
//!
//! The single entry point for callers. Picks mock or live generation and
//! degrades to mock output whenever the live path fails, so `generate` itself
//! never fails for provider faults.

use crate::error::LlmError;
use crate::extract::extract_json;
use crate::mock;
use crate::prompts::{self, GenerationMode};
use crate::provider::{ProviderConfig, ProviderRegistry};
use crate::tree::{DecisionNode, GenerationContext};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder question used by [`Engine::test_connection`].
pub const TEST_QUESTION: &str = "测试连接";

/// Simulated latencies for mock output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Delay before answering in demo mode.
    pub mock_delay: Duration,
    /// Delay before answering with mock output after a live failure.
    pub fallback_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mock_delay: Duration::from_millis(1500),
            fallback_delay: Duration::from_millis(1000),
        }
    }
}

impl EngineSettings {
    /// No simulated latency (CLI, tests).
    pub fn immediate() -> Self {
        Self {
            mock_delay: Duration::ZERO,
            fallback_delay: Duration::ZERO,
        }
    }
}

/// Outcome of [`Engine::test_connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
}

/// Stateless generation engine. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct Engine {
    providers: ProviderRegistry,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(providers: ProviderRegistry, settings: EngineSettings) -> Self {
        Self {
            providers,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Generate a tree (no context) or one layer (with context).
    ///
    /// Live failures are logged and answered with mock output for the same
    /// mode.
    pub async fn generate(
        &self,
        question: &str,
        config: &ProviderConfig,
        context: Option<&GenerationContext>,
    ) -> DecisionNode {
        if config.provider.is_mock() {
            pause(self.settings.mock_delay).await;
            return mock::synthesize(question, context);
        }

        match self.call_provider(question, config, context).await {
            Ok(node) => node,
            Err(e) => {
                warn!("LLM call via {} failed: {}", config.provider, e);
                warn!("Falling back to mock generation");
                pause(self.settings.fallback_delay).await;
                mock::synthesize(question, context)
            }
        }
    }

    /// Like [`generate`](Self::generate) but surfaces provider errors instead
    /// of falling back. Mock configs still answer from the synthesizer.
    pub async fn generate_live(
        &self,
        question: &str,
        config: &ProviderConfig,
        context: Option<&GenerationContext>,
    ) -> Result<DecisionNode, LlmError> {
        if config.provider.is_mock() {
            return Ok(mock::synthesize(question, context));
        }
        self.call_provider(question, config, context).await
    }

    /// One live call with a placeholder question. Never falls back.
    pub async fn test_connection(&self, config: &ProviderConfig) -> ConnectionReport {
        if config.provider.is_mock() {
            return ConnectionReport {
                success: true,
                message: "演示模式无需测试".to_string(),
            };
        }

        match self.call_provider(TEST_QUESTION, config, None).await {
            Ok(_) => {
                info!("Connection test via {} succeeded", config.provider);
                ConnectionReport {
                    success: true,
                    message: "API 连接成功".to_string(),
                }
            }
            Err(e) => {
                warn!("Connection test via {} failed: {}", config.provider, e);
                ConnectionReport {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }

    async fn call_provider(
        &self,
        question: &str,
        config: &ProviderConfig,
        context: Option<&GenerationContext>,
    ) -> Result<DecisionNode, LlmError> {
        let mode = GenerationMode::from_context(context);
        let provider = self.providers.get(&config.provider)?;
        debug!("Generating {} via {}", mode.label(), provider.name());

        let system_prompt = prompts::system_prompt(question, mode);
        let raw = provider.send(question, &system_prompt, config).await?;
        let node = DecisionNode::from_value(extract_json(&raw)?)?;

        let issues = node.validate();
        if !issues.is_empty() {
            warn!(
                "{} output has {} schema issue(s): {}",
                provider.name(),
                issues.len(),
                issues
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }
        Ok(node)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
