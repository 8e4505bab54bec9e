//! Emotion evaluation: the structured answer of the emotion endpoint.

use serde::{Deserialize, Serialize};

use crate::output::StructuredOutput;

/// Five-point emotion scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Emotion {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::VeryNegative,
        Emotion::Negative,
        Emotion::Neutral,
        Emotion::Positive,
        Emotion::VeryPositive,
    ];

    /// Wire label, e.g. `VERY_NEGATIVE`.
    pub fn label(self) -> &'static str {
        match self {
            Emotion::VeryNegative => "VERY_NEGATIVE",
            Emotion::Negative => "NEGATIVE",
            Emotion::Neutral => "NEUTRAL",
            Emotion::Positive => "POSITIVE",
            Emotion::VeryPositive => "VERY_POSITIVE",
        }
    }
}

/// The model's judgement of the emotion in a prompt, with its reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionEvaluation {
    pub emotion: Emotion,
    pub reason: Vec<String>,
}

impl StructuredOutput for EmotionEvaluation {
    const NAME: &'static str = "EmotionEvaluation";

    fn json_schema() -> serde_json::Value {
        let labels: Vec<&str> = Emotion::ALL.iter().map(|e| e.label()).collect();
        serde_json::json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {
                "emotion": { "type": "string", "enum": labels },
                "reason": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
            },
            "required": ["emotion", "reason"],
            "additionalProperties": false
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.reason.is_empty() {
            return Err("reason must list at least one entry".into());
        }
        Ok(())
    }
}
