//! Satirical AI worry-therapy pipeline.
//!
//! `butler-rs` processes a user's worry through a fixed three-persona chain
//! of chat-completion calls against an OpenAI-compatible API (OpenAI cloud
//! or a local Ollama server). The core abstraction is the
//! [`WorryChain`](chain::WorryChain) — a sequential pipeline where each
//! persona's raw text output is embedded into the next persona's prompt:
//!
//! 1. **Overthinker** (courtroom: *Prosecutor*) — melodramatic worst-case
//!    scenarios, high temperature.
//! 2. **Therapist** (courtroom: *Defense*) — CBT reframing of the
//!    Overthinker's doom, medium temperature.
//! 3. **Executive** (courtroom: *Judge*) — exactly one actionable or
//!    reassuring verdict sentence, low temperature.
//!
//! # Getting started
//!
//! ```ignore
//! use butler_rs::api::provider::ProviderConfig;
//! use butler_rs::chain::{ChainConfig, WorryChain};
//! use butler_rs::CompletionClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let provider = ProviderConfig::resolve(None, None)?;
//!     let client = CompletionClient::new(&provider)?;
//!
//!     let config = ChainConfig::new(&provider.model);
//!     let report = WorryChain::new(&client, config)
//!         .run("I'm worried about my presentation tomorrow")
//!         .await?;
//!
//!     println!("{}", report.executive);
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Persona prompts and stage wiring:** [`persona`] — system prompts,
//!   temperatures, and the user-prompt builders that thread each stage's
//!   output into the next.
//! - **The sequential pipeline:** [`chain::WorryChain`] and
//!   [`chain::ChainConfig`]; results come back as a
//!   [`chain::WorryReport`].
//! - **Single-call mode:** [`concierge`] — all three persona outputs from
//!   one strict-JSON completion, with fence stripping and a one-shot
//!   repair call.
//! - **Observing a run:** implement [`events::EventHandler`], or use
//!   [`events::LoggingHandler`] for tracing-based logging.
//! - **Provider selection and retries:** [`api::provider`] and
//!   [`api::retry`].
//! - **Output rendering:** [`report`] (text, JSON, courtroom skin) and
//!   [`history`] (append-only JSONL session log).

pub mod api;
pub mod chain;
pub mod concierge;
pub mod events;
pub mod history;
pub mod persona;
pub mod report;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

/// Path of the OpenAI-compatible chat completions endpoint, relative to a
/// provider base URL. Both OpenAI and Ollama serve it.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Default max tokens per persona response.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Covers the subset of the OpenAI-compatible
/// API the pipeline uses — unused optional fields are omitted from
/// serialization.
#[derive(Serialize, Debug, Default, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    /// `None` leaves the sampling temperature to the provider default.
    /// `Some(0.0)` is a real request for determinism and is always sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// JSON output format type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormatType {
    #[serde(rename = "json_object")]
    JsonObject,
}

/// JSON output mode.
#[derive(Serialize, Debug, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: ResponseFormatType,
}

impl ResponseFormat {
    /// Request a `json_object` response.
    pub fn json_object() -> Self {
        Self {
            fmt_type: ResponseFormatType::JsonObject,
        }
    }
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`CompletionClient::chat()`].
#[derive(Debug, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Backend trait ──────────────────────────────────────────────────

/// Boxed future returned by [`ChatBackend::chat`].
///
/// Type alias to keep trait signatures and implementations readable.
pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<ChatCompletion, String>> + Send + 'a>>;

/// The seam between the pipeline and the completion API.
///
/// The pipeline only needs "send a request, get a completion". Implementors
/// are the real [`CompletionClient`] in production and mock backends in
/// tests and the web crate's integration suite.
pub trait ChatBackend: Send + Sync {
    fn chat<'a>(&'a self, body: &'a ChatRequest) -> ChatFuture<'a>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct CompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl CompletionClient {
    /// Create a client from a resolved provider configuration.
    pub fn new(provider: &api::provider::ProviderConfig) -> Result<Self, String> {
        Self::with_endpoint(provider.chat_url(), provider.api_key.clone())
    }

    /// Create a client against an explicit endpoint URL. `api_key` is sent
    /// as a bearer token when present (Ollama needs none).
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("worry-butler/0.3")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, String> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={:?}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let mut req = self.client.post(&self.endpoint).json(body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        let elapsed = start.elapsed();
        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            elapsed.as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("completion API HTTP {status}: {text}"));
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))?;

        if let Some(err) = parsed.error {
            return Err(format!("completion API error: {}", err.message));
        }

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        let choice = parsed.choices.and_then(|c| c.into_iter().next());

        match choice {
            Some(c) => {
                debug!(
                    "LLM output: {} chars text",
                    c.message.content.as_ref().map_or(0, |s| s.len())
                );
                Ok(ChatCompletion {
                    content: c.message.content,
                    usage: parsed.usage,
                    finish_reason: c.finish_reason,
                })
            }
            None => {
                debug!("LLM output: empty (no choices)");
                Ok(ChatCompletion {
                    content: None,
                    usage: parsed.usage,
                    finish_reason: None,
                })
            }
        }
    }
}

impl ChatBackend for CompletionClient {
    fn chat<'a>(&'a self, body: &'a ChatRequest) -> ChatFuture<'a> {
        Box::pin(self.chat(body))
    }
}
