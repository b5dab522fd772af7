//! Events and handlers for observing a chain run.
//!
//! The chain communicates with callers through [`ChainEvent`] variants that
//! cover the lifecycle of a run — stage start, stage output, token usage,
//! retries, completion. Callers implement [`EventHandler`] to observe these
//! for CLI progress output, web broadcasting, or logging.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`CompositeEventHandler`] | Compose multiple handlers in order |
//! | Custom `impl EventHandler` | Full control (progress bars, metrics) |

use crate::persona::PersonaKind;
use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by the chain during a run.
#[derive(Debug)]
pub enum ChainEvent<'a> {
    /// A persona stage is about to call the model.
    StageStart {
        stage: PersonaKind,
        index: usize,
        total: usize,
    },
    /// A persona stage produced its output.
    StageFinished { stage: PersonaKind, output: &'a str },
    /// Token usage reported by the API for one call.
    TokenUsage {
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    /// A transient failure is being retried after a backoff delay.
    Retrying {
        stage: PersonaKind,
        attempt: u32,
        max_retries: u32,
        error: &'a str,
    },
    /// The whole chain completed.
    Finished { elapsed_ms: u64 },
}

/// Observer for [`ChainEvent`]s.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &ChainEvent<'_>);
}

// ── Built-in handlers ──────────────────────────────────────────────

/// Handler that ignores all events.
pub struct NoopHandler;

impl EventHandler for NoopHandler {
    fn on_event(&self, _event: &ChainEvent<'_>) {}
}

/// Handler that logs events through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &ChainEvent<'_>) {
        match event {
            ChainEvent::StageStart {
                stage,
                index,
                total,
            } => info!("stage {}/{total}: {stage} speaking...", index + 1),
            ChainEvent::StageFinished { stage, output } => {
                debug!("{stage} produced {} chars", output.len());
            }
            ChainEvent::TokenUsage {
                prompt_tokens,
                completion_tokens,
            } => debug!("token usage: prompt={prompt_tokens}, completion={completion_tokens}"),
            ChainEvent::Retrying {
                stage,
                attempt,
                max_retries,
                error,
            } => warn!("{stage} call failed (attempt {attempt}/{max_retries}), retrying: {error}"),
            ChainEvent::Finished { elapsed_ms } => {
                info!("worry processed in {:.1}s", *elapsed_ms as f64 / 1000.0);
            }
        }
    }
}

/// Composes multiple handlers; each event is delivered to all of them in
/// registration order.
#[derive(Default)]
pub struct CompositeEventHandler<'a> {
    handlers: Vec<&'a dyn EventHandler>,
}

impl<'a> CompositeEventHandler<'a> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: &'a dyn EventHandler) -> Self {
        self.handlers.push(handler);
        self
    }
}

impl EventHandler for CompositeEventHandler<'_> {
    fn on_event(&self, event: &ChainEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler(AtomicUsize);

    impl EventHandler for CountingHandler {
        fn on_event(&self, _event: &ChainEvent<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn composite_delivers_to_all() {
        let a = CountingHandler(AtomicUsize::new(0));
        let b = CountingHandler(AtomicUsize::new(0));
        let composite = CompositeEventHandler::new().with(&a).with(&b);

        composite.on_event(&ChainEvent::Finished { elapsed_ms: 1 });
        composite.on_event(&ChainEvent::StageStart {
            stage: PersonaKind::Overthinker,
            index: 0,
            total: 3,
        });

        assert_eq!(a.0.load(Ordering::SeqCst), 2);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn noop_accepts_everything() {
        NoopHandler.on_event(&ChainEvent::TokenUsage {
            prompt_tokens: 1,
            completion_tokens: 2,
        });
    }
}
