//! Rendering a [`WorryReport`] for humans and machines.
//!
//! Two presentation skins exist over the same three stages: the classic
//! therapy names and the courtroom aliases used by the visual-novel
//! frontend. Text output labels each section; JSON output is the report
//! serialized verbatim.

use crate::chain::WorryReport;
use crate::persona::PersonaKind;

/// Which set of display names to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skin {
    /// Overthinker / Therapist / Executive.
    #[default]
    Classic,
    /// Prosecutor / Defense / Judge.
    Courtroom,
}

impl Skin {
    /// Display name for a stage under this skin.
    pub fn stage_label(&self, kind: PersonaKind) -> &'static str {
        match self {
            Skin::Classic => kind.classic_name(),
            Skin::Courtroom => kind.courtroom_name(),
        }
    }
}

/// Render a report as labelled CLI text.
pub fn render_text(report: &WorryReport, skin: Skin) -> String {
    let rule = "─".repeat(60);
    let sections = [
        (PersonaKind::Overthinker, report.overthinker.as_str()),
        (PersonaKind::Therapist, report.therapist.as_str()),
        (PersonaKind::Executive, report.executive.as_str()),
    ];

    let mut out = String::new();
    out.push_str(&format!("Worry: {}\n", report.worry));
    for (kind, text) in sections {
        out.push_str(&format!("\n{rule}\n{}\n{rule}\n{text}\n", skin.stage_label(kind)));
    }
    out.push_str(&format!(
        "\n({} mode, {} in {:.1}s, {} prompt + {} completion tokens)\n",
        report.metadata.mode,
        report.metadata.model,
        report.metadata.elapsed_ms as f64 / 1000.0,
        report.metadata.prompt_tokens,
        report.metadata.completion_tokens,
    ));
    out
}

/// Render a report as pretty-printed JSON.
pub fn render_json(report: &WorryReport) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|e| format!("failed to serialize report: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ReportMetadata;

    fn sample_report() -> WorryReport {
        WorryReport {
            worry: "the demo".into(),
            overthinker: "DOOM".into(),
            therapist: "breathe".into(),
            executive: "ship it".into(),
            metadata: ReportMetadata {
                model: "test-model".into(),
                mode: "sequential".into(),
                stage_sequence: vec!["Overthinker".into(), "Therapist".into(), "Executive".into()],
                elapsed_ms: 1500,
                prompt_tokens: 100,
                completion_tokens: 200,
            },
        }
    }

    #[test]
    fn classic_text_uses_therapy_names() {
        let text = render_text(&sample_report(), Skin::Classic);
        assert!(text.contains("Overthinker"));
        assert!(text.contains("Therapist"));
        assert!(text.contains("Executive"));
        assert!(text.contains("DOOM"));
        assert!(text.contains("ship it"));
    }

    #[test]
    fn courtroom_text_uses_aliases() {
        let text = render_text(&sample_report(), Skin::Courtroom);
        assert!(text.contains("Prosecutor"));
        assert!(text.contains("Defense"));
        assert!(text.contains("Judge"));
        assert!(!text.contains("Overthinker"));
    }

    #[test]
    fn sections_appear_in_stage_order() {
        let text = render_text(&sample_report(), Skin::Classic);
        let over = text.find("Overthinker").unwrap();
        let ther = text.find("Therapist").unwrap();
        let exec = text.find("Executive").unwrap();
        assert!(over < ther);
        assert!(ther < exec);
    }

    #[test]
    fn json_roundtrips() {
        let json = render_json(&sample_report()).unwrap();
        let back: WorryReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.worry, "the demo");
        assert_eq!(back.metadata.completion_tokens, 200);
    }
}
