//! Process a worry through the three-persona chain and print the result.
//!
//! Uses OpenAI when `OPENAI_API_KEY` is set, otherwise a local Ollama
//! server (`OLLAMA_BASE_URL`, default `http://localhost:11434`).
//!
//! # Examples
//!
//! ```sh
//! # One worry, classic output
//! butler --worry "I think my demo will crash on stage"
//!
//! # Pipe the worry from stdin, JSON output
//! echo "deadline panic" | butler --stdin --json
//!
//! # Courtroom skin, single-call concierge mode, two retries
//! butler --worry "taxes" --courtroom --concierge --retries 2
//!
//! # Interactive session with a history log
//! butler --history ~/.worry-butler/history.jsonl
//! ```

use butler_rs::api::provider::{ProviderConfig, ProviderKind};
use butler_rs::chain::{ChainConfig, WorryChain, WorryReport};
use butler_rs::concierge::run_concierge_with_handler;
use butler_rs::events::{ChainEvent, EventHandler};
use butler_rs::history::History;
use butler_rs::persona::PersonaKind;
use butler_rs::report::{Skin, render_json, render_text};
use butler_rs::{ChatBackend, CompletionClient};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Process a worry through the Overthinker, Therapist, and Executive
/// personas and print the result.
#[derive(Parser)]
#[command(name = "butler")]
struct Cli {
    // ── Input ──────────────────────────────────────────────────
    /// The worry to process (omit for an interactive session)
    #[arg(long)]
    worry: Option<String>,

    /// Read the worry from stdin
    #[arg(long)]
    stdin: bool,

    // ── Provider / model ───────────────────────────────────────
    /// Completion provider (default: openai if OPENAI_API_KEY is set,
    /// otherwise ollama)
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Model to use (default: provider-specific)
    #[arg(long)]
    model: Option<String>,

    // ── Pipeline ───────────────────────────────────────────────
    /// Single-call concierge mode instead of the three-stage chain
    #[arg(long)]
    concierge: bool,

    /// Retries for transient API failures (0 = fail fast)
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Maximum tokens per persona response
    #[arg(long, default_value_t = 1024)]
    max_tokens: u32,

    /// Override the Overthinker temperature (default 0.9)
    #[arg(long)]
    overthinker_temperature: Option<f32>,

    /// Override the Therapist temperature (default 0.7)
    #[arg(long)]
    therapist_temperature: Option<f32>,

    /// Override the Executive temperature (default 0.3)
    #[arg(long)]
    executive_temperature: Option<f32>,

    // ── Output ─────────────────────────────────────────────────
    /// Print the report as pretty JSON
    #[arg(long)]
    json: bool,

    /// Use courtroom labels (Prosecutor / Defense / Judge)
    #[arg(long)]
    courtroom: bool,

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

/// Event handler that prints stage progress to stderr.
struct CliEventHandler;

impl EventHandler for CliEventHandler {
    fn on_event(&self, event: &ChainEvent<'_>) {
        match event {
            ChainEvent::StageStart {
                stage,
                index,
                total,
            } => eprintln!("  [{}/{total}] {stage} is thinking...", index + 1),
            ChainEvent::Retrying {
                stage,
                attempt,
                max_retries,
                error,
            } => eprintln!("  [retry {attempt}/{max_retries}] {stage}: {error}"),
            _ => {}
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn read_stdin_content() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf)
}

fn build_chain_config(cli: &Cli, model: &str) -> ChainConfig {
    let mut config = ChainConfig::new(model)
        .with_max_tokens(cli.max_tokens)
        .with_retries(cli.retries);
    if let Some(t) = cli.overthinker_temperature {
        config = config.with_stage_temperature(PersonaKind::Overthinker, t);
    }
    if let Some(t) = cli.therapist_temperature {
        config = config.with_stage_temperature(PersonaKind::Therapist, t);
    }
    if let Some(t) = cli.executive_temperature {
        config = config.with_stage_temperature(PersonaKind::Executive, t);
    }
    config
}

async fn process_worry(
    cli: &Cli,
    backend: &dyn ChatBackend,
    config: &ChainConfig,
    history: Option<&History>,
    worry: &str,
) -> Result<String, String> {
    let handler = CliEventHandler;
    let report: WorryReport = if cli.concierge {
        run_concierge_with_handler(backend, config, worry, &handler).await?
    } else {
        WorryChain::new(backend, config.clone())
            .with_event_handler(&handler)
            .run(worry)
            .await?
    };

    if let Some(history) = history {
        history.append(&report)?;
    }

    if cli.json {
        render_json(&report)
    } else {
        let skin = if cli.courtroom {
            Skin::Courtroom
        } else {
            Skin::Classic
        };
        Ok(render_text(&report, skin))
    }
}

/// Interactive session: one worry per line until EOF or "quit".
async fn run_interactive(
    cli: &Cli,
    backend: &dyn ChatBackend,
    config: &ChainConfig,
    history: Option<&History>,
) -> Result<(), String> {
    eprintln!("Worry Butler — type a worry, or \"quit\" to leave.");
    let stdin = io::stdin();
    loop {
        eprint!("worry> ");
        io::stderr().flush().ok();

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| format!("failed to read input: {e}"))?;
        if read == 0 {
            return Ok(());
        }
        let worry = line.trim();
        if worry.is_empty() {
            continue;
        }
        if worry.eq_ignore_ascii_case("quit") || worry.eq_ignore_ascii_case("exit") {
            return Ok(());
        }

        match process_worry(cli, backend, config, history, worry).await {
            Ok(output) => println!("{output}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
}

async fn run(cli: &Cli) -> Result<(), String> {
    let provider = ProviderConfig::resolve(
        cli.provider.map(ProviderKind::from),
        cli.model.as_deref(),
    )?;
    let client = CompletionClient::new(&provider)?;
    let config = build_chain_config(cli, &provider.model);
    let history = cli.history.as_ref().map(History::new);

    let worry = match (&cli.worry, cli.stdin) {
        (Some(worry), false) => Some(worry.clone()),
        (Some(worry), true) => Some(format!("{worry}\n\n{}", read_stdin_content()?)),
        (None, true) => Some(read_stdin_content()?),
        (None, false) => None,
    };

    match worry {
        Some(worry) => {
            let output = process_worry(cli, &client, &config, history.as_ref(), &worry).await?;
            print!("{output}");
            Ok(())
        }
        None => run_interactive(cli, &client, &config, history.as_ref()).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
