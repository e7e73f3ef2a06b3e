// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Message content extraction
//!
//! Canvas documents are stored as a `code` block in `json` whose payload is
//! an object with a `content` key. They are rendered as markdown code blocks
//! and replace the regular text of the turn.

use serde_json::Value;

use super::export::ExportMessage;
use crate::text::{sanitize_text, sanitize_value};

fn is_canvas(object: &Value) -> bool {
    object.get("content_type").and_then(Value::as_str) == Some("code")
        && object.get("language").and_then(Value::as_str) == Some("json")
}

fn is_image_pointer(part: &Value) -> bool {
    part.get("content_type").and_then(Value::as_str) == Some("image_asset_pointer")
}

/// Concatenate the textual parts of a message
///
/// String parts are taken directly; object parts contribute their `text`
/// string unless they are canvas blocks or image pointers.
pub fn parts_to_text(parts: &[Value]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Value::String(s) => Some(sanitize_text(s)),
            Value::Object(_) if is_canvas(part) || is_image_pointer(part) => None,
            Value::Object(_) => part.get("text").and_then(Value::as_str).map(sanitize_text),
            _ => None,
        })
        .collect()
}

/// `content` of a canvas payload, sanitized
fn canvas_payload(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let data: Value = serde_json::from_str(text).ok()?;
    data.as_object()?
        .get("content")
        .map(sanitize_value)
}

/// Wrap canvas text in a markdown code block unless it already is one
pub fn format_canvas(content: &str) -> String {
    let content = content.trim();
    if content.starts_with("```markdown") && content.ends_with("```") {
        return content.to_string();
    }
    format!("```markdown\n{}\n```", content)
}

/// First canvas block among message parts
pub fn canvas_from_parts(parts: &[Value]) -> Option<String> {
    parts
        .iter()
        .filter(|part| part.is_object() && is_canvas(part))
        .filter_map(|part| part.get("text").and_then(Value::as_str).and_then(canvas_payload))
        .map(|content| format!("```markdown\n{}\n```", content))
        .next()
}

/// Canvas content of a message, checking the content object before its parts
pub fn extract_canvas(message: &ExportMessage) -> Option<String> {
    let content = message.content();
    if is_canvas(content) {
        let payload = content
            .get("text")
            .and_then(Value::as_str)
            .and_then(canvas_payload);
        if let Some(payload) = payload {
            return Some(format_canvas(&payload));
        }
    }
    canvas_from_parts(message.parts())
}

/// Regular text of a message, sanitized
pub fn message_text(message: &ExportMessage) -> String {
    parts_to_text(message.parts())
}

/// Text of a flat-list entry: its `text` field, else its content list
pub fn flat_entry_text(message: &ExportMessage) -> String {
    if let Some(text) = message.text.as_ref().and_then(Value::as_str) {
        if !text.is_empty() {
            return sanitize_text(text);
        }
    }
    match message.content.as_ref() {
        Some(Value::Array(parts)) => parts_to_text(parts),
        _ => String::new(),
    }
}
