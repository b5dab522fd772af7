//! Courtroom web server — end-to-end butler-web demo.
//!
//! Serves the courtroom page and the worry-processing API against a real
//! completion provider.
//!
//! # Usage
//!
//! ```bash
//! # Local Ollama (default when OPENAI_API_KEY is unset)
//! cargo run -p butler-web
//!
//! # OpenAI, custom port
//! OPENAI_API_KEY=sk-... cargo run -p butler-web -- --port 8080
//!
//! # Single-call concierge mode with a history log
//! cargo run -p butler-web -- --concierge --history worries.jsonl
//! ```
//!
//! Then open the printed URL, or:
//!
//! ```bash
//! curl -s localhost:3001/process-worry \
//!   -H 'Content-Type: application/json' \
//!   -d '{"worry": "my demo will crash"}'
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use butler_rs::CompletionClient;
use butler_rs::api::provider::{ProviderConfig, ProviderKind};
use butler_rs::chain::ChainConfig;
use butler_rs::history::History;
use butler_web::{AppState, WebConfig, spawn_web};
use clap::{Parser, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Courtroom web server for the worry-processing pipeline.
#[derive(Parser)]
#[command(about = "Serve the worry courtroom in a browser")]
struct Args {
    /// Port for the web server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Completion provider (default: openai if OPENAI_API_KEY is set,
    /// otherwise ollama)
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Model to use (default: provider-specific)
    #[arg(long)]
    model: Option<String>,

    /// Single-call concierge mode instead of the three-stage chain
    #[arg(long)]
    concierge: bool,

    /// Retries for transient API failures (0 = fail fast)
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Append each processed worry to this JSONL history file
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Openai,
    Ollama,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Openai => ProviderKind::OpenAi,
            ProviderArg::Ollama => ProviderKind::Ollama,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let provider = ProviderConfig::resolve(
        args.provider.map(ProviderKind::from),
        args.model.as_deref(),
    )?;
    let client = CompletionClient::new(&provider)?;

    let state = AppState {
        backend: Arc::new(client),
        config: ChainConfig::new(&provider.model).with_retries(args.retries),
        provider: provider.kind.to_string(),
        concierge: args.concierge,
        history: args
            .history
            .map(|path| Arc::new(Mutex::new(History::new(path)))),
    };

    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
    };
    let addr = spawn_web(state, config).await;
    println!("Courtroom: http://{addr}");
    println!("Provider: {} ({})", provider.kind, provider.model);

    // The server lives on a background task; park until Ctrl-C.
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for shutdown signal: {e}"))?;
    Ok(())
}
