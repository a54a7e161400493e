//! Arbor Daemon - decision tree generation service
//!
//! Serves the generation engine over HTTP for browser and edge clients.

use anyhow::Result;
use arbord::server::{self, AppState};
use arbord::settings::ServerSettings;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Arbor Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = ServerSettings::load();
    let engine = settings.build_engine()?;
    info!(
        "Mock delay {}ms, fallback delay {}ms, provider timeout {}s",
        settings.mock_delay_ms, settings.fallback_delay_ms, settings.request_timeout_secs
    );

    server::run(&settings.listen, AppState::new(engine)).await
}
