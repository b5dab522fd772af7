//! The sequential three-persona pipeline.
//!
//! [`WorryChain`] runs the Overthinker, Therapist, and Executive stages in
//! fixed order against a [`ChatBackend`]. Each stage's raw text output is
//! embedded into the next stage's user prompt; a stage failure aborts the
//! run — no partial report is ever returned.
//!
//! # Example
//!
//! ```ignore
//! let config = ChainConfig::new("gpt-4o-mini").with_retries(2);
//! let report = WorryChain::new(&client, config)
//!     .with_event_handler(&LoggingHandler)
//!     .run("I'm worried about my presentation tomorrow")
//!     .await?;
//! println!("{}", report.executive);
//! ```

use crate::api::retry::{self, RetryConfig};
use crate::events::{ChainEvent, EventHandler, NoopHandler};
use crate::persona::{self, Persona, PersonaKind};
use crate::{ChatBackend, ChatCompletion, ChatRequest, DEFAULT_MAX_TOKENS, Message};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ── Configuration ──────────────────────────────────────────────────

/// Per-stage temperature overrides. `None` uses the persona default
/// (0.9 / 0.7 / 0.3).
#[derive(Debug, Clone, Default)]
pub struct StageTemperatures {
    pub overthinker: Option<f32>,
    pub therapist: Option<f32>,
    pub executive: Option<f32>,
}

impl StageTemperatures {
    /// The effective temperature for a stage.
    pub fn for_stage(&self, kind: PersonaKind) -> f32 {
        let over = match kind {
            PersonaKind::Overthinker => self.overthinker,
            PersonaKind::Therapist => self.therapist,
            PersonaKind::Executive => self.executive,
        };
        over.unwrap_or(Persona::of(kind).temperature)
    }
}

/// Configuration for a chain run.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Model identifier (e.g. `"gpt-4o-mini"` or `"llama3.1:8b"`).
    pub model: String,
    /// Maximum tokens per persona response.
    pub max_tokens: u32,
    /// Per-stage temperature overrides.
    pub temperatures: StageTemperatures,
    /// Retry configuration for transient API failures. Off by default.
    pub retry: RetryConfig,
}

impl ChainConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperatures: StageTemperatures::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Set the maximum tokens per persona response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Enable automatic retries for transient API failures (429, 5xx,
    /// network errors). Pass `0` to disable (the default).
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(max_retries);
        self
    }

    /// Override the temperature for one stage.
    pub fn with_stage_temperature(mut self, stage: PersonaKind, temperature: f32) -> Self {
        match stage {
            PersonaKind::Overthinker => self.temperatures.overthinker = Some(temperature),
            PersonaKind::Therapist => self.temperatures.therapist = Some(temperature),
            PersonaKind::Executive => self.temperatures.executive = Some(temperature),
        }
        self
    }
}

// ── Report ─────────────────────────────────────────────────────────

/// The complete output of one processed worry, fields populated in stage
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorryReport {
    /// The user's original worry.
    pub worry: String,
    /// Dramatic worst-case exploration (stage 1).
    pub overthinker: String,
    /// CBT reframing (stage 2).
    pub therapist: String,
    /// One-sentence verdict (stage 3).
    pub executive: String,
    pub metadata: ReportMetadata,
}

/// Processing information recorded alongside a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub model: String,
    /// `"sequential"` or `"concierge"`.
    pub mode: String,
    /// Stage names in the order they ran.
    pub stage_sequence: Vec<String>,
    pub elapsed_ms: u64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Chain ──────────────────────────────────────────────────────────

/// Sequential three-stage worry processor.
pub struct WorryChain<'a> {
    backend: &'a dyn ChatBackend,
    config: ChainConfig,
    event_handler: &'a dyn EventHandler,
}

impl<'a> WorryChain<'a> {
    pub fn new(backend: &'a dyn ChatBackend, config: ChainConfig) -> Self {
        Self {
            backend,
            config,
            event_handler: &NoopHandler,
        }
    }

    /// Attach an event handler for progress observation.
    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    /// Process a worry through the three personas in order.
    pub async fn run(&self, worry: &str) -> Result<WorryReport, String> {
        let worry = worry.trim();
        if worry.is_empty() {
            return Err("worry must not be empty".to_string());
        }

        let start = Instant::now();
        let mut prompt_tokens = 0u32;
        let mut completion_tokens = 0u32;

        let stages = PersonaKind::chain_order();
        let mut outputs: Vec<String> = Vec::with_capacity(stages.len());

        for (index, kind) in stages.iter().enumerate() {
            self.event_handler.on_event(&ChainEvent::StageStart {
                stage: *kind,
                index,
                total: stages.len(),
            });

            let user_prompt = match kind {
                PersonaKind::Overthinker => persona::overthinker_user_prompt(worry),
                PersonaKind::Therapist => persona::therapist_user_prompt(worry, &outputs[0]),
                PersonaKind::Executive => {
                    persona::executive_user_prompt(worry, &outputs[0], &outputs[1])
                }
            };

            let body = ChatRequest {
                model: self.config.model.clone(),
                messages: vec![
                    Message::system(Persona::of(*kind).system_prompt),
                    Message::user(user_prompt),
                ],
                max_tokens: self.config.max_tokens,
                temperature: Some(self.config.temperatures.for_stage(*kind)),
                response_format: None,
            };

            let completion = self.chat_with_retry(*kind, &body).await?;

            if let Some(ref u) = completion.usage {
                let pt = u.prompt_tokens.unwrap_or(0);
                let ct = u.completion_tokens.unwrap_or(0);
                prompt_tokens += pt;
                completion_tokens += ct;
                self.event_handler.on_event(&ChainEvent::TokenUsage {
                    prompt_tokens: pt,
                    completion_tokens: ct,
                });
            }

            let text = completion
                .content
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .ok_or_else(|| format!("{kind} stage returned an empty response"))?;

            self.event_handler.on_event(&ChainEvent::StageFinished {
                stage: *kind,
                output: &text,
            });
            outputs.push(text);
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.event_handler
            .on_event(&ChainEvent::Finished { elapsed_ms });

        let executive = outputs.pop().unwrap_or_default();
        let therapist = outputs.pop().unwrap_or_default();
        let overthinker = outputs.pop().unwrap_or_default();

        Ok(WorryReport {
            worry: worry.to_string(),
            overthinker,
            therapist,
            executive,
            metadata: ReportMetadata {
                model: self.config.model.clone(),
                mode: "sequential".to_string(),
                stage_sequence: stages.iter().map(|k| k.to_string()).collect(),
                elapsed_ms,
                prompt_tokens,
                completion_tokens,
            },
        })
    }

    /// One API call under the configured retry policy, with each retry
    /// surfaced as a [`ChainEvent::Retrying`].
    async fn chat_with_retry(
        &self,
        stage: PersonaKind,
        body: &ChatRequest,
    ) -> Result<ChatCompletion, String> {
        let max_retries = self.config.retry.max_retries;
        retry::retry_api_call_observed(
            &self.config.retry,
            || self.backend.chat(body),
            |attempt, error| {
                self.event_handler.on_event(&ChainEvent::Retrying {
                    stage,
                    attempt,
                    max_retries,
                    error,
                });
            },
        )
        .await
        .map_err(|e| format!("{stage} stage failed: {e}"))
    }
}
