//! Single-call mode: all three persona outputs from one completion.
//!
//! The concierge asks the model for a strict JSON object with the three
//! persona keys instead of running three sequential calls. Providers are
//! sloppy about "strict": the parser strips markdown code fences, falls
//! back to extracting the first balanced `{...}` block from surrounding
//! prose, and makes exactly one repair call with a sterner prompt before
//! giving up.

use crate::api::retry::retry_api_call;
use crate::chain::{ChainConfig, ReportMetadata, WorryReport};
use crate::events::{ChainEvent, EventHandler, NoopHandler};
use crate::persona::{self, PersonaKind, prompts};
use crate::{ChatBackend, ChatRequest, Message, ResponseFormat};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, warn};

/// Concierge stage temperature: balanced enough to cover all three voices.
const CONCIERGE_TEMPERATURE: f32 = 0.7;

/// The JSON bundle the concierge prompt demands.
#[derive(Debug, Deserialize)]
struct ConciergeBundle {
    overthinker: String,
    therapist: String,
    executive: String,
}

/// Run the single-call concierge and return a full report.
pub async fn run_concierge(
    backend: &dyn ChatBackend,
    config: &ChainConfig,
    worry: &str,
) -> Result<WorryReport, String> {
    run_concierge_with_handler(backend, config, worry, &NoopHandler).await
}

/// Like [`run_concierge`], with chain events delivered to `handler`.
pub async fn run_concierge_with_handler(
    backend: &dyn ChatBackend,
    config: &ChainConfig,
    worry: &str,
    handler: &dyn EventHandler,
) -> Result<WorryReport, String> {
    let worry = worry.trim();
    if worry.is_empty() {
        return Err("worry must not be empty".to_string());
    }

    let start = Instant::now();
    let mut prompt_tokens = 0u32;
    let mut completion_tokens = 0u32;

    handler.on_event(&ChainEvent::StageStart {
        stage: PersonaKind::Overthinker,
        index: 0,
        total: 1,
    });

    let body = request_body(config, prompts::CONCIERGE_SYSTEM, &persona::concierge_user_prompt(worry));
    let completion = retry_api_call(&config.retry, || backend.chat(&body)).await?;
    if let Some(ref u) = completion.usage {
        prompt_tokens += u.prompt_tokens.unwrap_or(0);
        completion_tokens += u.completion_tokens.unwrap_or(0);
    }
    let raw = completion
        .content
        .ok_or_else(|| "concierge call returned an empty response".to_string())?;

    let bundle = match parse_bundle(&raw) {
        Ok(bundle) => bundle,
        Err(parse_err) => {
            // One repair attempt with a sterner prompt, then give up.
            warn!("concierge output failed to parse ({parse_err}), attempting repair call");
            let repair_user = format!("{}\n\nUser worry: \"{worry}\"", prompts::CONCIERGE_REPAIR);
            let repair_body = request_body(config, prompts::CONCIERGE_SYSTEM, &repair_user);
            let repaired = retry_api_call(&config.retry, || backend.chat(&repair_body)).await?;
            if let Some(ref u) = repaired.usage {
                prompt_tokens += u.prompt_tokens.unwrap_or(0);
                completion_tokens += u.completion_tokens.unwrap_or(0);
            }
            let repaired_raw = repaired
                .content
                .ok_or_else(|| "concierge repair call returned an empty response".to_string())?;
            parse_bundle(&repaired_raw).map_err(|repair_err| {
                let preview = preview(&raw);
                format!(
                    "concierge expected strict JSON but could not parse provider output \
                     (first attempt: {parse_err}; repair attempt: {repair_err}). \
                     Raw preview: {preview}"
                )
            })?
        }
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    handler.on_event(&ChainEvent::Finished { elapsed_ms });

    Ok(WorryReport {
        worry: worry.to_string(),
        overthinker: bundle.overthinker,
        therapist: bundle.therapist,
        executive: bundle.executive,
        metadata: ReportMetadata {
            model: config.model.clone(),
            mode: "concierge".to_string(),
            stage_sequence: vec!["Concierge".to_string()],
            elapsed_ms,
            prompt_tokens,
            completion_tokens,
        },
    })
}

fn request_body(config: &ChainConfig, system: &str, user: &str) -> ChatRequest {
    ChatRequest {
        model: config.model.clone(),
        messages: vec![Message::system(system), Message::user(user)],
        max_tokens: config.max_tokens,
        temperature: Some(CONCIERGE_TEMPERATURE),
        response_format: Some(ResponseFormat::json_object()),
    }
}

// ── Parsing ────────────────────────────────────────────────────────

/// Parse provider output into a bundle, tolerating fences and prose.
fn parse_bundle(raw: &str) -> Result<ConciergeBundle, String> {
    let text = strip_code_fences(raw.trim());

    let bundle: ConciergeBundle = match serde_json::from_str(text) {
        Ok(bundle) => bundle,
        Err(direct_err) => {
            debug!("direct JSON parse failed ({direct_err}), trying block extraction");
            let block = extract_json_block(text)
                .ok_or_else(|| format!("no JSON object found in output: {direct_err}"))?;
            serde_json::from_str(block).map_err(|e| format!("extracted block invalid: {e}"))?
        }
    };

    for (key, value) in [
        ("overthinker", &bundle.overthinker),
        ("therapist", &bundle.therapist),
        ("executive", &bundle.executive),
    ] {
        if value.trim().is_empty() {
            return Err(format!("concierge bundle key '{key}' is empty"));
        }
    }
    Ok(bundle)
}

/// Strip a surrounding markdown code fence (```json ... ``` or ``` ... ```).
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the fence line.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim_matches('`').trim(),
    }
}

/// Extract the first balanced `{...}` block, respecting JSON strings.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn preview(text: &str) -> String {
    const MAX: usize = 200;
    if text.len() > MAX {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &text[..end])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatCompletion, ChatFuture};
    use std::sync::Mutex;

    const GOOD_JSON: &str =
        r#"{"overthinker": "DOOM!", "therapist": "breathe", "executive": "go to bed"}"#;

    struct ScriptedBackend {
        outputs: Vec<&'static str>,
        calls: Mutex<usize>,
    }

    impl ScriptedBackend {
        fn new(outputs: Vec<&'static str>) -> Self {
            Self {
                outputs,
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn chat<'a>(&'a self, _body: &'a ChatRequest) -> ChatFuture<'a> {
            Box::pin(async move {
                let mut calls = self.calls.lock().unwrap();
                let index = *calls;
                *calls += 1;
                let content = self
                    .outputs
                    .get(index)
                    .ok_or_else(|| format!("unexpected call #{index}"))?;
                Ok(ChatCompletion {
                    content: Some((*content).to_string()),
                    usage: None,
                    finish_reason: Some("stop".into()),
                })
            })
        }
    }

    #[test]
    fn parses_bare_json() {
        let bundle = parse_bundle(GOOD_JSON).unwrap();
        assert_eq!(bundle.overthinker, "DOOM!");
        assert_eq!(bundle.executive, "go to bed");
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{GOOD_JSON}\n```");
        let bundle = parse_bundle(&fenced).unwrap();
        assert_eq!(bundle.therapist, "breathe");
    }

    #[test]
    fn parses_fence_without_language_tag() {
        let fenced = format!("```\n{GOOD_JSON}\n```");
        assert!(parse_bundle(&fenced).is_ok());
    }

    #[test]
    fn extracts_json_from_surrounding_prose() {
        let wrapped = format!("Sure, here is the output you asked for:\n{GOOD_JSON}\nHope it helps!");
        let bundle = parse_bundle(&wrapped).unwrap();
        assert_eq!(bundle.overthinker, "DOOM!");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let tricky = r#"note {"overthinker": "imagine {chaos}!", "therapist": "ok", "executive": "x"} end"#;
        let bundle = parse_bundle(tricky).unwrap();
        assert_eq!(bundle.overthinker, "imagine {chaos}!");
    }

    #[test]
    fn empty_key_rejected() {
        let err = parse_bundle(r#"{"overthinker": "", "therapist": "b", "executive": "c"}"#)
            .unwrap_err();
        assert!(err.contains("overthinker"));
    }

    #[test]
    fn missing_key_rejected() {
        assert!(parse_bundle(r#"{"overthinker": "a", "therapist": "b"}"#).is_err());
    }

    #[tokio::test]
    async fn single_call_builds_full_report() {
        let backend = ScriptedBackend::new(vec![GOOD_JSON]);
        let config = ChainConfig::new("test-model");
        let report = run_concierge(&backend, &config, "the worry").await.unwrap();

        assert_eq!(backend.call_count(), 1);
        assert_eq!(report.overthinker, "DOOM!");
        assert_eq!(report.therapist, "breathe");
        assert_eq!(report.executive, "go to bed");
        assert_eq!(report.metadata.mode, "concierge");
    }

    #[tokio::test]
    async fn repair_call_recovers_from_garbage() {
        let backend = ScriptedBackend::new(vec!["I cannot produce JSON, sorry.", GOOD_JSON]);
        let config = ChainConfig::new("test-model");
        let report = run_concierge(&backend, &config, "the worry").await.unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(report.executive, "go to bed");
    }

    #[tokio::test]
    async fn exactly_one_repair_attempt() {
        let backend = ScriptedBackend::new(vec!["garbage", "more garbage", GOOD_JSON]);
        let config = ChainConfig::new("test-model");
        let err = run_concierge(&backend, &config, "the worry")
            .await
            .unwrap_err();

        assert_eq!(backend.call_count(), 2, "must stop after one repair");
        assert!(err.contains("repair attempt"));
    }

    #[tokio::test]
    async fn requests_json_response_format() {
        let config = ChainConfig::new("test-model");
        let body = request_body(&config, "sys", "user");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(body.temperature, Some(CONCIERGE_TEMPERATURE));
    }
}
