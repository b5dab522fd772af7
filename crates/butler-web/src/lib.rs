//! Browser frontend for the worry-processing pipeline.
//!
//! `butler-web` provides an axum server that serves a courtroom-themed
//! page at `/` and a small JSON API: `POST /process-worry` runs a worry
//! through the persona pipeline and returns the three outputs plus a
//! dialogue scene, `GET /health` reports the configured provider.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use butler_rs::api::provider::ProviderConfig;
//! use butler_rs::chain::ChainConfig;
//! use butler_rs::CompletionClient;
//! use butler_web::{AppState, WebConfig, spawn_web};
//!
//! let provider = ProviderConfig::resolve(None, None)?;
//! let state = AppState {
//!     backend: Arc::new(CompletionClient::new(&provider)?),
//!     config: ChainConfig::new(&provider.model),
//!     provider: provider.kind.to_string(),
//!     concierge: false,
//!     history: None,
//! };
//! let addr = spawn_web(state, WebConfig::default()).await;
//! println!("Courtroom: http://{addr}");
//! # Ok::<(), String>(())
//! ```

mod api;
pub mod dialogue;
mod page;
mod server;

pub use api::{AppState, WorryRequest, WorryResponse};
pub use dialogue::{Character, DialogueLine, build_dialogue, select_emotion};

use std::net::SocketAddr;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// Binding port 0 picks a free port; the returned address carries the
/// real one. The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(state: AppState, config: WebConfig) -> SocketAddr {
    let router = server::build_router(state);
    server::start_server(router, config.bind_addr).await
}
