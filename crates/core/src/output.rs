//! Structured output: coercing a provider's free text into a typed shape.
//!
//! The provider is told to answer with JSON matching a schema; the answer is
//! then parsed with `serde_json`. A mismatch is a [`Error::Parse`], never a
//! silent default.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// A type the model can be asked to produce.
pub trait StructuredOutput: DeserializeOwned {
    /// Type name used in error messages.
    const NAME: &'static str;

    /// JSON Schema the model's answer must conform to.
    fn json_schema() -> serde_json::Value;

    /// Instructions appended to the user message at dispatch time.
    fn format_instructions() -> String {
        let schema = serde_json::to_string_pretty(&Self::json_schema()).unwrap_or_default();
        format!(
            "Your response must be a single RFC 8259 compliant JSON document and nothing else.\n\
             Do not add explanations and do not wrap the JSON in markdown code fences.\n\
             The JSON must validate against this JSON Schema:\n\
             ```{schema}```"
        )
    }

    /// Constraints the schema states but serde cannot enforce.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Parse the model's raw answer.
    fn parse(raw: &str) -> Result<Self> {
        let parse_error = |reason: String| Error::Parse {
            target: Self::NAME,
            reason,
            raw: raw.to_string(),
        };
        let value: Self = serde_json::from_str(strip_code_fence(raw)).map_err(|e| parse_error(e.to_string()))?;
        value.validate().map_err(parse_error)?;
        Ok(value)
    }
}

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````), which
/// models add despite being told not to.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    match body.find('\n') {
        Some(newline) if !body[..newline].contains('{') => body[newline + 1..].trim(),
        _ => body.trim(),
    }
}
