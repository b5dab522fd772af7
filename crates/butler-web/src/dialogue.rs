//! Courtroom dialogue built from a processed worry.
//!
//! Each persona output becomes one dialogue line spoken by its courtroom
//! character, with a sprite chosen by scanning the text for emotion
//! keywords. Selection is deterministic so the frontend can be tested
//! without rendering anything.

use butler_rs::chain::WorryReport;
use serde::Serialize;

/// A courtroom speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Character {
    Prosecutor,
    Defense,
    Judge,
}

impl Character {
    pub fn display_name(&self) -> &'static str {
        match self {
            Character::Prosecutor => "The Prosecutor",
            Character::Defense => "The Defense",
            Character::Judge => "The Judge",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Character::Prosecutor => "prosecutor",
            Character::Defense => "defense",
            Character::Judge => "judge",
        }
    }

    /// Where the character stands on screen.
    fn position(&self) -> &'static str {
        match self {
            Character::Prosecutor => "left",
            Character::Defense => "right",
            Character::Judge => "center",
        }
    }

    /// Background shown while the character speaks. The attorneys get the
    /// bench matching their side; the judge gets the judge's stand.
    fn background(&self) -> &'static str {
        match self {
            Character::Prosecutor => "courtroom-left",
            Character::Defense => "courtroom-right",
            Character::Judge => "courtroom-judge",
        }
    }

    /// Emotion keyword table, first match wins. The fallback emotion is
    /// the last entry's, applied when no keyword matches.
    fn emotion_table(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Character::Prosecutor => &[
                (
                    "angry",
                    &[
                        "horror",
                        "disaster",
                        "catastrophe",
                        "terrible",
                        "awful",
                        "horrible",
                        "worst",
                        "nightmare",
                    ],
                ),
                (
                    "intense",
                    &["everything", "everyone", "always", "never", "doom", "ruin"],
                ),
                (
                    "smug",
                    &["obviously", "clearly", "of course", "inevitable", "evidence"],
                ),
                (
                    "worried",
                    &["might", "could", "possibly", "what if", "risk"],
                ),
            ],
            Character::Defense => &[
                (
                    "cheerful",
                    &["great", "wonderful", "good news", "bright", "hope"],
                ),
                (
                    "reassuring",
                    &["okay", "alright", "normal", "natural", "understandable", "valid"],
                ),
                (
                    "gentle",
                    &["breathe", "gently", "kind", "rest", "soften"],
                ),
                (
                    "confident",
                    &["you can", "capable", "strength", "handled", "manage"],
                ),
            ],
            Character::Judge => &[
                (
                    "decisive",
                    &["verdict", "decide", "decision", "therefore", "final"],
                ),
                (
                    "serious",
                    &["must", "important", "critical", "essential"],
                ),
                (
                    "thoughtful",
                    &["consider", "perhaps", "weigh", "reflect"],
                ),
                (
                    "speaking",
                    &["recommend", "suggest", "advise", "tonight", "today"],
                ),
            ],
        }
    }

    fn default_emotion(&self) -> &'static str {
        match self {
            Character::Prosecutor => "dramatic",
            Character::Defense => "calm",
            Character::Judge => "neutral",
        }
    }
}

/// One line of courtroom dialogue, ready for the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct DialogueLine {
    pub character: Character,
    /// Display name, e.g. "The Prosecutor".
    pub name: &'static str,
    /// Detected emotion, e.g. "angry".
    pub emotion: &'static str,
    /// Sprite name the frontend maps to an asset, e.g. "prosecutor-angry".
    pub sprite: String,
    /// Background name for the line, e.g. "courtroom-left".
    pub background: &'static str,
    /// Screen position: "left", "right" or "center".
    pub position: &'static str,
    pub text: String,
}

/// Pick the character's emotion for a piece of text, case-insensitively.
pub fn select_emotion(character: Character, text: &str) -> &'static str {
    let lower = text.to_lowercase();
    for (emotion, keywords) in character.emotion_table() {
        if keywords.iter().any(|k| lower.contains(k)) {
            return emotion;
        }
    }
    character.default_emotion()
}

fn line(character: Character, text: &str) -> DialogueLine {
    let emotion = select_emotion(character, text);
    DialogueLine {
        character,
        name: character.display_name(),
        emotion,
        sprite: format!("{}-{emotion}", character.slug()),
        background: character.background(),
        position: character.position(),
        text: text.to_string(),
    }
}

/// Convert a report into the courtroom scene, in stage order.
pub fn build_dialogue(report: &WorryReport) -> Vec<DialogueLine> {
    vec![
        line(Character::Prosecutor, &report.overthinker),
        line(Character::Defense, &report.therapist),
        line(Character::Judge, &report.executive),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use butler_rs::chain::ReportMetadata;

    fn report(overthinker: &str, therapist: &str, executive: &str) -> WorryReport {
        WorryReport {
            worry: "w".into(),
            overthinker: overthinker.into(),
            therapist: therapist.into(),
            executive: executive.into(),
            metadata: ReportMetadata {
                model: "m".into(),
                mode: "sequential".into(),
                stage_sequence: vec![],
                elapsed_ms: 0,
                prompt_tokens: 0,
                completion_tokens: 0,
            },
        }
    }

    #[test]
    fn keyword_picks_emotion() {
        assert_eq!(
            select_emotion(Character::Prosecutor, "This is a DISASTER of epic scale"),
            "angry"
        );
        assert_eq!(
            select_emotion(Character::Defense, "It is completely normal to feel this"),
            "reassuring"
        );
        assert_eq!(
            select_emotion(Character::Judge, "The verdict: go to bed"),
            "decisive"
        );
    }

    #[test]
    fn no_keyword_falls_back_to_default() {
        assert_eq!(select_emotion(Character::Prosecutor, "hmm"), "dramatic");
        assert_eq!(select_emotion(Character::Defense, "hmm"), "calm");
        assert_eq!(select_emotion(Character::Judge, "hmm"), "neutral");
    }

    #[test]
    fn earlier_table_entries_win() {
        // "nightmare" (angry) beats "obviously" (smug).
        let text = "Obviously this nightmare ends badly";
        assert_eq!(select_emotion(Character::Prosecutor, text), "angry");
    }

    #[test]
    fn dialogue_is_three_lines_in_stage_order() {
        let lines = build_dialogue(&report("doom", "breathe", "the verdict is rest"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].character, Character::Prosecutor);
        assert_eq!(lines[0].position, "left");
        assert_eq!(lines[1].character, Character::Defense);
        assert_eq!(lines[1].position, "right");
        assert_eq!(lines[2].character, Character::Judge);
        assert_eq!(lines[2].position, "center");
        assert_eq!(lines[2].sprite, "judge-decisive");
    }

    #[test]
    fn each_line_carries_its_background() {
        let lines = build_dialogue(&report("a", "b", "c"));
        assert_eq!(lines[0].background, "courtroom-left");
        assert_eq!(lines[1].background, "courtroom-right");
        assert_eq!(lines[2].background, "courtroom-judge");
    }

    #[test]
    fn character_serializes_lowercase() {
        let json = serde_json::to_value(Character::Prosecutor).unwrap();
        assert_eq!(json, "prosecutor");
    }
}
