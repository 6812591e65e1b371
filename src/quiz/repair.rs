//! Best-effort structured extraction of model JSON output.
//!
//! Model responses asked to be "ONLY a valid JSON object" still arrive
//! wrapped in Markdown fences or cut off mid-generation when the token
//! budget runs out. This routine strips fences, tries a direct parse, and
//! then salvages every complete object preceding the truncation point.

use serde_json::{json, Value};

/// Parse a model response into a JSON object, repairing truncation.
///
/// In order, first success wins:
/// 1. strip fenced code-block markers if present;
/// 2. parse directly;
/// 3. truncate at the last closed object boundary (`},`) inside the array
///    and close the brackets, recovering a partial-but-valid array.
///
/// Anything unsalvageable yields `{"questions": []}` so callers fall
/// through to their deterministic fallback.
pub fn sanitize_and_parse(text: &str) -> Value {
    let text = strip_code_fences(text.trim());
    let text = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return value;
    }

    repair_truncated(text).unwrap_or_else(|| json!({ "questions": [] }))
}

/// Remove Markdown code fences, keeping the fenced body.
fn strip_code_fences(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        return body.split("```").next().unwrap_or(body);
    }
    if text.contains("```") {
        let mut parts = text.splitn(3, "```");
        parts.next();
        if let Some(body) = parts.next() {
            return body;
        }
    }
    text
}

/// Salvage complete question objects from a response cut off mid-generation.
fn repair_truncated(text: &str) -> Option<Value> {
    // Without an array there is nothing to salvage.
    text.find('[')?;

    // The last `},` marks the end of the last complete object in the array.
    let last_object_end = text.rfind("},")?;
    let repaired = format!("{}]}}", &text[..=last_object_end]);

    serde_json::from_str(&repaired).ok()
}
