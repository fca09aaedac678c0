//! End-of-utterance turn detection.
//!
//! Estimates whether the user's most recent utterance is complete. The
//! agent uses the estimate to pick an endpointing delay: the minimum delay
//! when the turn looks finished, the maximum when the user is likely to
//! continue. The scoring here is a lightweight lexical heuristic standing
//! in front of the media-plane model; the scheduling decision stays in the
//! agent either way.

use bna_types::{ChatContext, ChatRole};
use serde::{Deserialize, Serialize};

fn default_unlikely_threshold() -> f32 {
    0.15
}

/// Tunables for the end-of-utterance model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnDetectorConfig {
    /// Probability below which the turn is treated as incomplete and the
    /// maximum endpointing delay applies.
    #[serde(default = "default_unlikely_threshold")]
    pub unlikely_threshold: f32,
}

impl Default for TurnDetectorConfig {
    fn default() -> Self {
        Self {
            unlikely_threshold: default_unlikely_threshold(),
        }
    }
}

/// Words that, when trailing, signal the speaker intends to continue.
const CONTINUATION_WORDS: &[&str] = &[
    "and", "but", "or", "so", "because", "with", "the", "a", "um", "uh",
];

/// End-of-utterance scorer over the chat context.
#[derive(Debug, Clone)]
pub struct EouModel {
    config: TurnDetectorConfig,
}

impl EouModel {
    pub fn new(config: TurnDetectorConfig) -> Self {
        Self { config }
    }

    pub fn unlikely_threshold(&self) -> f32 {
        self.config.unlikely_threshold
    }

    /// Probability in [0, 1] that the last user utterance is complete.
    pub fn predict(&self, ctx: &ChatContext) -> f32 {
        let Some(message) = ctx
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
        else {
            return 0.0;
        };

        let text = message.content.trim();
        if text.is_empty() {
            return 0.0;
        }

        if text.ends_with(['.', '!', '?']) {
            return 0.9;
        }

        let last_word = text
            .rsplit(|c: char| !c.is_alphanumeric() && c != '\'')
            .find(|w| !w.is_empty())
            .unwrap_or("")
            .to_lowercase();

        if text.ends_with(',') || CONTINUATION_WORDS.contains(&last_word.as_str()) {
            return 0.05;
        }

        0.5
    }

    /// True when the turn is likely finished and the minimum endpointing
    /// delay should apply.
    pub fn likely_end_of_turn(&self, ctx: &ChatContext) -> bool {
        self.predict(ctx) >= self.config.unlikely_threshold
    }
}

impl Default for EouModel {
    fn default() -> Self {
        Self::new(TurnDetectorConfig::default())
    }
}
