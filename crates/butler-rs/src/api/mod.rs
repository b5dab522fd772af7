//! Provider resolution and retry policy for the completion API.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`provider`] | OpenAI / Ollama selection from flags and environment |
//! | [`retry`] | Doubling, capped backoff for transient failures |

pub mod provider;
pub mod retry;
