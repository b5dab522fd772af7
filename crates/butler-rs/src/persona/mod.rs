//! Personas: the fixed roles each stage of the chain speaks in.
//!
//! A [`Persona`] bundles a system prompt, a stage temperature, and display
//! names for the two presentation skins (classic therapy names and the
//! courtroom aliases). The `*_user_prompt` methods build the per-stage user
//! message, embedding the previous stages' raw output — this sequential
//! dependency is the whole data model of the pipeline.

pub mod prompts;

use serde::{Deserialize, Serialize};

/// The three fixed stages, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaKind {
    Overthinker,
    Therapist,
    Executive,
}

impl PersonaKind {
    /// All personas in chain order.
    pub fn chain_order() -> [PersonaKind; 3] {
        [
            PersonaKind::Overthinker,
            PersonaKind::Therapist,
            PersonaKind::Executive,
        ]
    }

    /// Classic therapy-skin display name.
    pub fn classic_name(&self) -> &'static str {
        match self {
            PersonaKind::Overthinker => "Overthinker",
            PersonaKind::Therapist => "Therapist",
            PersonaKind::Executive => "Executive",
        }
    }

    /// Courtroom-skin display name.
    pub fn courtroom_name(&self) -> &'static str {
        match self {
            PersonaKind::Overthinker => "Prosecutor",
            PersonaKind::Therapist => "Defense",
            PersonaKind::Executive => "Judge",
        }
    }
}

impl std::fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.classic_name())
    }
}

/// A persona: system prompt plus stage generation parameters.
#[derive(Debug, Clone)]
pub struct Persona {
    pub kind: PersonaKind,
    pub system_prompt: &'static str,
    /// Stage temperature: 0.9 for drama, 0.7 for balance, 0.3 for verdicts.
    pub temperature: f32,
}

impl Persona {
    /// The built-in persona for a stage.
    pub fn of(kind: PersonaKind) -> Self {
        match kind {
            PersonaKind::Overthinker => Self {
                kind,
                system_prompt: prompts::OVERTHINKER_SYSTEM,
                temperature: 0.9,
            },
            PersonaKind::Therapist => Self {
                kind,
                system_prompt: prompts::THERAPIST_SYSTEM,
                temperature: 0.7,
            },
            PersonaKind::Executive => Self {
                kind,
                system_prompt: prompts::EXECUTIVE_SYSTEM,
                temperature: 0.3,
            },
        }
    }
}

// ── Stage user prompts ─────────────────────────────────────────────
//
// Stage N's prompt embeds stage N-1's raw output verbatim. Quoting the
// text (rather than summarizing) is deliberate: the Therapist reacts to
// the Overthinker's actual phrasing, and the Executive sees everything.

/// Stage 1: the Overthinker gets the bare worry.
pub fn overthinker_user_prompt(worry: &str) -> String {
    format!(
        "The user has shared this worry: \"{worry}\"\n\n\
         Acknowledge it dramatically, explore 2-3 worst-case scenarios in \
         your theatrical style, and show you understand the depth of the \
         concern. Respond in your signature over-the-top style."
    )
}

/// Stage 2: the Therapist gets the worry plus the Overthinker's dramatics.
pub fn therapist_user_prompt(worry: &str, overthinker_output: &str) -> String {
    format!(
        "The user originally worried about: \"{worry}\"\n\n\
         The Overthinker responded with this dramatic exploration:\n\
         \"{overthinker_output}\"\n\n\
         The worst cases have been aired. Validate the feelings, name and \
         challenge the cognitive distortions, offer practical coping \
         strategies, and help the user find a balanced perspective."
    )
}

/// Stage 3: the Executive gets the full session.
pub fn executive_user_prompt(worry: &str, overthinker_output: &str, therapist_output: &str) -> String {
    format!(
        "Here is the complete worry-processing session:\n\n\
         Original worry: \"{worry}\"\n\n\
         Overthinker response: \"{overthinker_output}\"\n\n\
         Therapist response: \"{therapist_output}\"\n\n\
         Deliver your verdict: exactly ONE sentence that summarizes the key \
         insight and is actionable or reassuring, specific to this \
         situation, and memorable. You are the final voice they hear."
    )
}

/// Concierge user prompt: one call producing all three outputs.
pub fn concierge_user_prompt(worry: &str) -> String {
    format!(
        "User worry: \"{worry}\"\n\n\
         Create the three role outputs as described. Follow the output \
         format exactly."
    )
}
