//! Tolerant parsing of model output into an [`ExecutionPlan`].
//!
//! Models are told to emit bare JSON but regularly wrap it in markdown
//! fences or use loose priority spellings. This module:
//! - Strips a surrounding code fence (```` ```json ```` or bare ```` ``` ````).
//! - Decodes the remainder as JSON.
//! - Normalizes every priority field to `High`/`Medium`/`Low` where possible.
//! - Deserializes into the typed plan, which is the schema check.
//!
//! Fence stripping is a substring heuristic, not a markdown parser. JSON
//! surrounded by prose without fences is not extracted.

use serde_json::Value;
use thiserror::Error;

use super::types::ExecutionPlan;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Why a single model response could not be turned into a plan.
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("empty LLM response")]
    Empty,

    #[error("invalid JSON in LLM response: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("LLM response does not match the plan schema: {0}")]
    Schema(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Fence stripping
// ---------------------------------------------------------------------------

/// Remove a markdown code fence wrapped around the payload, if any.
///
/// Everything up to and including a ```` ```json ```` marker is dropped. If
/// there is no such marker but a bare ```` ``` ```` opens a fenced block, the
/// opening fence (and a language tag on its line) is dropped instead. Then
/// everything from the next fence onward is discarded.
///
/// An unclosed ```` ```json ```` block still yields its body, but an unclosed
/// bare ```` ``` ```` is not treated as an opening fence, so the cut at that
/// fence leaves only the text before it (usually nothing).
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(pos) = text.find(JSON_FENCE) {
        text = &text[pos + JSON_FENCE.len()..];
    } else if let Some(pos) = text.find(FENCE) {
        let rest = &text[pos + FENCE.len()..];
        if rest.contains(FENCE) {
            text = skip_language_tag(rest);
        }
    }

    if let Some(pos) = text.find(FENCE) {
        text = &text[..pos];
    }

    text.trim()
}

/// Drop an info string such as `JSON` or `javascript` directly after an
/// opening fence.
fn skip_language_tag(text: &str) -> &str {
    match text.split_once('\n') {
        Some((tag, rest)) if !tag.is_empty() && tag.trim().chars().all(char::is_alphanumeric) => {
            rest
        }
        _ => text,
    }
}

// ---------------------------------------------------------------------------
// Priority normalization
// ---------------------------------------------------------------------------

/// Map a loosely-spelled priority onto the canonical tier names.
///
/// Substrings are matched case-insensitively in the order high, medium, low.
/// Anything else is only capitalized, leaving the final verdict to schema
/// validation.
pub fn normalize_priority(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.contains("high") {
        "High".to_string()
    } else if lower.contains("medium") {
        "Medium".to_string()
    } else if lower.contains("low") {
        "Low".to_string()
    } else {
        capitalize(raw)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Normalize `priority_level` and every `execution_plan[*].priority` in place.
///
/// Non-string values are left untouched for validation to reject.
pub fn normalize_priorities(value: &mut Value) {
    if let Some(p) = value.get_mut("priority_level") {
        normalize_priority_value(p);
    }
    if let Some(Value::Array(steps)) = value.get_mut("execution_plan") {
        for step in steps {
            if let Some(p) = step.get_mut("priority") {
                normalize_priority_value(p);
            }
        }
    }
}

fn normalize_priority_value(value: &mut Value) {
    if let Value::String(s) = value {
        *s = normalize_priority(s);
    }
}

// ---------------------------------------------------------------------------
// Full parse
// ---------------------------------------------------------------------------

/// Parse one raw model response into a validated plan.
pub fn parse_plan(text: &str) -> Result<ExecutionPlan, PlanParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PlanParseError::Empty);
    }

    let body = strip_code_fences(text);
    let mut value: Value = serde_json::from_str(body).map_err(PlanParseError::InvalidJson)?;
    normalize_priorities(&mut value);
    serde_json::from_value(value).map_err(PlanParseError::Schema)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
