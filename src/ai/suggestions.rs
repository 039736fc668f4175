//! Parsing of model output into a suggestion list.

use crate::{Error, Result};
use serde_json::Value;

/// Removes a surrounding Markdown code fence (```json ... ```), if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the info string (e.g. `json`) on the opening fence line.
    match inner.split_once('\n') {
        Some((first_line, body)) if !starts_json(first_line) => body.trim(),
        _ => inner.trim(),
    }
}

fn starts_json(line: &str) -> bool {
    line.trim_start().starts_with(|c: char| c == '[' || c == '{')
}

/// Parses model output that should be a JSON array of strings.
///
/// Accepts a bare array or an object with a `suggestions` array. Blank
/// entries are dropped and the list is cut to `limit`.
pub fn parse_suggestions(text: &str, limit: usize) -> Result<Vec<String>> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body).map_err(|e| {
        tracing::error!("Suggestion output is not JSON: {}\nBody: {}", e, text);
        Error::AiProvider(format!("Suggestions are not valid JSON: {}", e))
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("suggestions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::AiProvider(
                    "Suggestions object has no 'suggestions' array".to_string(),
                ))
            }
        },
        other => {
            return Err(Error::AiProvider(format!(
                "Expected a JSON array of suggestions, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut suggestions = Vec::with_capacity(items.len().min(limit));
    for item in items {
        match item {
            Value::String(s) => {
                let s = s.trim();
                if !s.is_empty() {
                    suggestions.push(s.to_string());
                }
            }
            other => {
                return Err(Error::AiProvider(format!(
                    "Expected only strings in suggestions, found {}",
                    json_kind(&other)
                )))
            }
        }
    }

    suggestions.truncate(limit);
    Ok(suggestions)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
