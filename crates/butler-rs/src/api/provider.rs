//! Provider selection: OpenAI cloud or a local Ollama server.
//!
//! Both speak the OpenAI-compatible chat completions protocol, so the rest
//! of the crate never branches on the provider — it only sees an endpoint
//! URL, an optional API key, and a model name.
//!
//! Resolution order: an explicit choice wins; otherwise OpenAI is used when
//! `OPENAI_API_KEY` is set, and Ollama is the fallback.

use crate::CHAT_COMPLETIONS_PATH;
use tracing::debug;

/// Default OpenAI base URL. Override with `OPENAI_BASE_URL`.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
/// Default OpenAI model. Override with `OPENAI_MODEL`.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default Ollama base URL. Override with `OLLAMA_BASE_URL`.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
/// Default Ollama model. Override with `OLLAMA_MODEL`.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";

/// Which completion provider backs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI cloud API. Requires `OPENAI_API_KEY`.
    OpenAi,
    /// Local Ollama server (OpenAI-compatible endpoint). No key needed.
    Ollama,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

/// A fully resolved provider: endpoint, credentials, and model.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Resolve a provider from an optional explicit choice and model
    /// override, falling back to environment variables.
    ///
    /// With no explicit choice: OpenAI if `OPENAI_API_KEY` is set, Ollama
    /// otherwise. Choosing OpenAI explicitly without a key is an error.
    pub fn resolve(
        preferred: Option<ProviderKind>,
        model_override: Option<&str>,
    ) -> Result<Self, String> {
        let openai_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        let kind = match preferred {
            Some(kind) => kind,
            None if openai_key.is_some() => ProviderKind::OpenAi,
            None => ProviderKind::Ollama,
        };

        let config = match kind {
            ProviderKind::OpenAi => {
                let api_key = openai_key
                    .ok_or_else(|| "OPENAI_API_KEY is not set but the OpenAI provider was requested".to_string())?;
                Self {
                    kind,
                    base_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
                    model: model_override
                        .map(str::to_string)
                        .unwrap_or_else(|| env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL)),
                    api_key: Some(api_key),
                }
            }
            ProviderKind::Ollama => Self {
                kind,
                base_url: env_or("OLLAMA_BASE_URL", DEFAULT_OLLAMA_BASE_URL),
                model: model_override
                    .map(str::to_string)
                    .unwrap_or_else(|| env_or("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL)),
                api_key: None,
            },
        };

        debug!(
            "Resolved provider: {} (model={}, base_url={})",
            config.kind, config.model, config.base_url
        );
        Ok(config)
    }

    /// Full URL of the chat completions endpoint.
    pub fn chat_url(&self) -> String {
        format!(
            "{}{CHAT_COMPLETIONS_PATH}",
            self.base_url.trim_end_matches('/')
        )
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
