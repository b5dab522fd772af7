//! REST endpoint handlers.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use butler_rs::ChatBackend;
use butler_rs::chain::{ChainConfig, ReportMetadata, WorryChain};
use butler_rs::concierge::run_concierge;
use butler_rs::history::History;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::dialogue::{DialogueLine, build_dialogue};
use crate::page;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    pub config: ChainConfig,
    /// Provider label reported by `/health`, e.g. "openai" or "ollama".
    pub provider: String,
    /// Use the single-call concierge instead of the three-stage chain.
    pub concierge: bool,
    pub history: Option<Arc<Mutex<History>>>,
}

/// GET / — The courtroom page.
pub async fn index() -> Html<&'static str> {
    Html(page::INDEX_HTML)
}

/// Request body for POST /process-worry.
#[derive(Deserialize)]
pub struct WorryRequest {
    pub worry: String,
}

/// Response body for POST /process-worry.
#[derive(Serialize)]
pub struct WorryResponse {
    pub worry: String,
    pub overthinker: String,
    pub therapist: String,
    pub executive: String,
    /// Courtroom scene, one line per persona in stage order.
    pub dialogue: Vec<DialogueLine>,
    pub metadata: ReportMetadata,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

/// POST /process-worry — Run the full pipeline on one worry.
///
/// Returns 400 for an empty worry and 502 when the upstream completion
/// call fails.
pub async fn process_worry(
    State(app): State<AppState>,
    Json(body): Json<WorryRequest>,
) -> Result<Json<WorryResponse>, ApiError> {
    if body.worry.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "worry must not be empty",
        ));
    }

    info!("processing worry ({} chars)", body.worry.len());

    let report = if app.concierge {
        run_concierge(app.backend.as_ref(), &app.config, &body.worry).await
    } else {
        WorryChain::new(app.backend.as_ref(), app.config.clone())
            .run(&body.worry)
            .await
    }
    .map_err(|e| {
        warn!("pipeline failed: {e}");
        error_response(StatusCode::BAD_GATEWAY, &e)
    })?;

    // A history write failure should not lose the response.
    if let Some(ref history) = app.history
        && let Ok(history) = history.lock()
        && let Err(e) = history.append(&report)
    {
        warn!("failed to append history: {e}");
    }

    let dialogue = build_dialogue(&report);
    Ok(Json(WorryResponse {
        worry: report.worry,
        overthinker: report.overthinker,
        therapist: report.therapist,
        executive: report.executive,
        dialogue,
        metadata: report.metadata,
    }))
}

/// GET /health — Provider and model info.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "provider": app.provider,
        "model": app.config.model,
        "mode": if app.concierge { "concierge" } else { "sequential" },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worry_request_deserializes() {
        let req: WorryRequest = serde_json::from_str(r#"{"worry":"the demo"}"#).unwrap();
        assert_eq!(req.worry, "the demo");
    }

    #[test]
    fn error_response_carries_message() {
        let (status, body) = error_response(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["error"], "nope");
    }
}
