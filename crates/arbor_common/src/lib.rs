//! Arbor Common - decision tree generation engine.
//!
//! Turns a natural-language question into a branching decision tree, either
//! through a live LLM provider or the deterministic mock synthesizer.
//!
//! ```text
//! Engine ──► ProviderRegistry ──► TreeProvider::send ──► extract_json ──► DecisionNode
//!    │
//!    └─────► mock::synthesize ─────────────────────────────────────────► DecisionNode
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod mock;
pub mod prompts;
pub mod provider;
pub mod tree;

pub use config::{ConfigError, ConfigStore};
pub use engine::{ConnectionReport, Engine, EngineSettings};
pub use error::LlmError;
pub use extract::extract_json;
pub use prompts::GenerationMode;
pub use provider::{ProviderConfig, ProviderKind, ProviderRegistry, TreeProvider};
pub use tree::{DecisionNode, GenerationContext, SchemaIssue, TreeOption};
