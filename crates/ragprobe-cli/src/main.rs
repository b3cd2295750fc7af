//! ragprobe - ask a RAG endpoint questions from the terminal
//!
//! Usage:
//!   ragprobe ask <question> [--top-k N] [--json]
//!   ragprobe repl
//!   ragprobe mock-server [--addr ADDR] [--delay-ms MS]
//!
//! Author: hephaex@gmail.com

mod logging;
mod render;
mod repl;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ragprobe_client::{ChannelNotifier, QueryController, TracingNotifier};
use ragprobe_core::config::AppConfig;
use ragprobe_core::{InteractionState, Notifier};
use ragprobe_mock::state::MockState;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ragprobe")]
#[command(about = "Ask questions against a retrieval-augmented generation endpoint")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, short = 'c', global = true, env = "RAGPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Query endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log level filter, e.g. "debug" or "warn"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one question and print the answer
    Ask {
        /// Question to ask
        question: String,

        /// Number of contexts to retrieve, clamped to 1-10
        #[arg(long, short = 'k', allow_negative_numbers = true)]
        top_k: Option<i64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session with an editable draft
    Repl {
        /// Initial number of contexts, clamped to 1-10
        #[arg(long, short = 'k', allow_negative_numbers = true)]
        top_k: Option<i64>,
    },
    /// Run the local fixture endpoint
    MockServer {
        /// Listen address
        #[arg(long)]
        addr: Option<String>,

        /// Artificial latency per query in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint.url = endpoint.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    match &cli.command {
        Commands::Ask { top_k: Some(k), .. } | Commands::Repl { top_k: Some(k) } => {
            config.query.default_top_k = *k;
        }
        Commands::MockServer { addr, delay_ms } => {
            if let Some(addr) = addr {
                config.mock.addr = addr.clone();
            }
            if let Some(delay_ms) = delay_ms {
                config.mock.delay_ms = *delay_ms;
            }
        }
        _ => {}
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init(&config.logging);

    match cli.command {
        Commands::Ask { question, json, .. } => ask(&config, question, json).await,
        Commands::Repl { .. } => {
            let (notifier, mut notifications) = ChannelNotifier::new();
            let controller = QueryController::from_config(&config, Arc::new(notifier))?;
            repl::run(&controller, &mut notifications).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::MockServer { .. } => {
            let state = Arc::new(MockState::from_config(&config.mock));
            let listener = tokio::net::TcpListener::bind(&config.mock.addr)
                .await
                .with_context(|| format!("failed to bind {}", config.mock.addr))?;
            tracing::info!(
                "Fixture RAG endpoint on http://{}/query",
                listener.local_addr()?
            );
            ragprobe_mock::serve(listener, state).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn ask(config: &AppConfig, question: String, json: bool) -> anyhow::Result<ExitCode> {
    let (channel, mut notifications) = ChannelNotifier::new();
    let notifier: Arc<dyn Notifier> = if json {
        Arc::new(TracingNotifier)
    } else {
        Arc::new(channel)
    };
    let controller = QueryController::from_config(config, notifier)?;
    controller.set_question_text(question);

    // Progress line while the request is outstanding
    let mut states = controller.subscribe();
    let progress = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            if let InteractionState::Submitting(query) = &*states.borrow_and_update() {
                eprintln!("Generating... (top {} contexts)", query.top_k());
            }
        }
    });

    let outcome = controller.submit().await;
    progress.abort();

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    while let Ok(notification) = notifications.try_recv() {
        render::render_notification(&notification, &mut stderr)?;
    }

    let state = match outcome {
        Ok(state) => state,
        Err(err) => {
            tracing::debug!(error = %err, "Query rejected");
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        render::render_json(&state, &mut stdout)?;
    } else {
        render::render_state(&state, &mut stdout)?;
    }

    Ok(match state {
        InteractionState::Success(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
