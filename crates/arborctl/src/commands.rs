//! Command handlers for arborctl.

use crate::render::{mask_key, render_tree};
use anyhow::{bail, Result};
use arbor_common::provider::{build_client, DEFAULT_TIMEOUT_SECS};
use arbor_common::{
    ConfigStore, DecisionNode, Engine, EngineSettings, GenerationContext, ProviderConfig,
    ProviderKind, ProviderRegistry,
};
use owo_colors::OwoColorize;
use std::path::PathBuf;

/// Fields `config set` may change. `None` leaves the stored value alone.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub temperature: Option<f64>,
    pub save_to_local: bool,
}

impl ConfigUpdate {
    fn apply(self, mut config: ProviderConfig) -> ProviderConfig {
        if let Some(provider) = self.provider {
            config.provider = ProviderKind::from(provider);
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        config.save_to_local = self.save_to_local;
        config
    }
}

pub fn open_store(path: Option<PathBuf>) -> ConfigStore {
    match path {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::open_default(),
    }
}

/// In-process engine; the CLI never simulates latency.
fn engine() -> Result<Engine> {
    let client = build_client(DEFAULT_TIMEOUT_SECS)?;
    Ok(Engine::new(
        ProviderRegistry::http(client, DEFAULT_TIMEOUT_SECS),
        EngineSettings::immediate(),
    ))
}

/// Context for `step`: no choices means the first layer.
pub fn step_context(choices: Vec<String>, current_question: Option<String>) -> GenerationContext {
    match choices.last().cloned() {
        None => GenerationContext::first_level(),
        Some(selected) => {
            GenerationContext::after(choices, current_question.unwrap_or_default(), selected)
        }
    }
}

fn print_node(node: &DecisionNode, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(node)?);
    } else {
        println!("{}", render_tree(node));
    }
    Ok(())
}

pub async fn generate(store: &ConfigStore, question: &str, json: bool, strict: bool) -> Result<()> {
    let config = store.get_config();
    let engine = engine()?;

    let tree = if strict {
        engine.generate_live(question, &config, None).await?
    } else {
        engine.generate(question, &config, None).await
    };

    print_node(&tree, json)?;
    if !json {
        println!();
        println!(
            "{}",
            format!("{} layers, {} outcomes", tree.depth(), tree.leaf_count()).dimmed()
        );
    }
    Ok(())
}

pub async fn step(
    store: &ConfigStore,
    question: &str,
    choices: Vec<String>,
    current_question: Option<String>,
    json: bool,
) -> Result<()> {
    let config = store.get_config();
    let context = step_context(choices, current_question);
    let layer = engine()?.generate(question, &config, Some(&context)).await;

    print_node(&layer, json)?;
    if !json && layer.options.iter().any(|o| o.needs_generation()) {
        println!();
        println!(
            "{}",
            "Continue with: arborctl step <QUESTION> --choice <OPTION> ...".dimmed()
        );
    }
    Ok(())
}

pub async fn test(store: &ConfigStore) -> Result<()> {
    let config = store.get_config();
    println!("Testing {} ...", config.provider.bold());

    let report = engine()?.test_connection(&config).await;
    if report.success {
        println!("{} {}", "✓".green(), report.message);
        Ok(())
    } else {
        println!("{} {}", "✗".red(), report.message);
        bail!("connection test failed")
    }
}

pub fn config_show(store: &ConfigStore) -> Result<()> {
    let config = store.get_config();
    let kw = 14;

    println!("{:width$} {}", "file", store.path().display(), width = kw);
    println!("{:width$} {}", "provider", config.provider.bold(), width = kw);
    println!("{:width$} {}", "api_key", mask_key(&config.api_key), width = kw);
    println!("{:width$} {}", "model", config.model, width = kw);
    println!(
        "{:width$} {}",
        "endpoint",
        if config.endpoint.is_empty() { "-" } else { config.endpoint.as_str() },
        width = kw
    );
    println!("{:width$} {}", "temperature", config.temperature, width = kw);
    println!("{:width$} {}", "save_to_local", config.save_to_local, width = kw);
    Ok(())
}

pub fn config_set(store: &ConfigStore, update: ConfigUpdate) -> Result<()> {
    let config = update.apply(store.get_config());
    if let ProviderKind::Unsupported(name) = &config.provider {
        bail!("unknown provider '{}': use mock, openai, anthropic or custom", name);
    }

    store.set_config(&config)?;
    if config.save_to_local {
        println!("{} saved to {}", "✓".green(), store.path().display());
    } else {
        println!("{} not persisted; stored config removed", "✓".green());
    }
    Ok(())
}

pub fn config_reset(store: &ConfigStore) -> Result<()> {
    store.clear()?;
    println!("{} config reset to defaults", "✓".green());
    Ok(())
}
