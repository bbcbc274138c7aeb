//! Normalizes provider API payloads into plain assistant text.
//!
//! Extractors never fail: odd or missing fields produce empty text, and the
//! caller decides whether empty text is an error (the runner) or becomes the
//! [`NO_RESPONSE`] marker (the proxy).

use serde_json::Value;

/// Marker returned to proxy callers when the upstream payload carried no text.
pub const NO_RESPONSE: &str = "[No response]";

/// Anthropic Messages payload: `content` is a list of blocks, each with an
/// optional `text`. Non-empty block texts are joined with newlines.
pub fn anthropic_text(payload: &Value) -> String {
    let Some(blocks) = payload.get("content").and_then(Value::as_array) else {
        return String::new();
    };
    join_parts(blocks, "\n")
}

/// OpenAI-style chat completion payload (also used by Groq).
///
/// Reads `choices[0].message.content`, which is either a string or a list of
/// parts; a choice without `message` falls back to `choices[0].text`.
pub fn chat_completion_text(payload: &Value) -> String {
    let Some(first) = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        return String::new();
    };

    match first.get("message") {
        Some(message) => match message.get("content") {
            Some(Value::String(text)) => text.trim().to_string(),
            Some(Value::Array(parts)) => join_parts(parts, ""),
            _ => String::new(),
        },
        None => first
            .get("text")
            .and_then(Value::as_str)
            .map(|t| t.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Gemini generateContent payload: `candidates[0].content.parts[*].text`.
pub fn gemini_text(payload: &Value) -> String {
    payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| join_parts(parts, ""))
        .unwrap_or_default()
}

/// Anthropic text for proxy callers, with [`NO_RESPONSE`] in place of empty
/// text.
pub fn anthropic_text_or_marker(payload: &Value) -> String {
    or_marker(anthropic_text(payload))
}

pub fn or_marker(text: String) -> String {
    if text.is_empty() {
        NO_RESPONSE.to_string()
    } else {
        text
    }
}

fn join_parts(parts: &[Value], separator: &str) -> String {
    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
        .trim()
        .to_string()
}
