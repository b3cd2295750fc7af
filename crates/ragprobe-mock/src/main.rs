//! ragprobe fixture server
//!
//! Author: hephaex@gmail.com

use ragprobe_core::config::{AppConfig, LoggingConfig};
use ragprobe_mock::state::MockState;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.logging);

    let state = Arc::new(MockState::from_config(&config.mock));

    let listener = tokio::net::TcpListener::bind(&config.mock.addr).await?;
    tracing::info!("Fixture RAG endpoint on http://{}/query", listener.local_addr()?);

    ragprobe_mock::serve(listener, state).await?;

    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let default_filter = format!("{},ragprobe_mock=debug,tower_http=debug", config.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
