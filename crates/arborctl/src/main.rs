//! Arbor Control - CLI client for the decision tree engine
//!
//! Runs the engine in-process against the stored provider config.

mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Version is embedded at build time
const VERSION: &str = env!("ARBOR_VERSION");

#[derive(Parser, Debug)]
#[command(name = "arborctl")]
#[command(about = "Arbor - generate decision trees from a question", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Provider config file (defaults to $ARBOR_CONFIG or ~/.config/arbor/config.toml)
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a complete decision tree
    Generate {
        question: String,

        /// Print raw JSON instead of the rendered tree
        #[arg(long)]
        json: bool,

        /// Fail on provider errors instead of falling back to demo output
        #[arg(long)]
        strict: bool,
    },

    /// Generate one layer of an incremental session
    Step {
        question: String,

        /// Options chosen so far, in order; the last one is the current selection
        #[arg(long = "choice")]
        choices: Vec<String>,

        /// Question the last choice answered
        #[arg(long)]
        current_question: Option<String>,

        /// Print raw JSON instead of the rendered layer
        #[arg(long)]
        json: bool,
    },

    /// Check that the configured provider answers
    Test,

    /// Show or change the stored provider config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective config
    Show,

    /// Update fields of the stored config
    Set {
        /// mock, openai, anthropic or custom
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        model: Option<String>,

        /// Endpoint URL for the custom provider
        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long)]
        temperature: Option<f64>,

        /// Do not persist; removes any stored config
        #[arg(long)]
        no_save: bool,
    },

    /// Remove the stored config
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = commands::open_store(cli.config_file);

    match cli.command {
        Commands::Generate {
            question,
            json,
            strict,
        } => commands::generate(&store, &question, json, strict).await,
        Commands::Step {
            question,
            choices,
            current_question,
            json,
        } => commands::step(&store, &question, choices, current_question, json).await,
        Commands::Test => commands::test(&store).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(&store),
            ConfigAction::Set {
                provider,
                api_key,
                model,
                endpoint,
                temperature,
                no_save,
            } => commands::config_set(
                &store,
                commands::ConfigUpdate {
                    provider,
                    api_key,
                    model,
                    endpoint,
                    temperature,
                    save_to_local: !no_save,
                },
            ),
            ConfigAction::Reset => commands::config_reset(&store),
        },
    }
}
