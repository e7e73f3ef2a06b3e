// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Text helpers shared by every converter
//!
//! ChatGPT exports embed private-use-area code points (citation markers,
//! entity placeholders) that render as garbage in Open WebUI, so all
//! extracted text goes through [`sanitize_text`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// A run of characters terminated by sentence punctuation
static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]*[.!?]").expect("valid sentence regex"));

/// Whether `c` lies in one of the Unicode private-use ranges
pub fn is_private_use(c: char) -> bool {
    matches!(
        c as u32,
        0xE000..=0xF8FF | 0xF_0000..=0xF_FFFD | 0x10_0000..=0x10_FFFD
    )
}

/// Return `text` without private-use code points
pub fn sanitize_text(text: &str) -> String {
    text.chars().filter(|c| !is_private_use(*c)).collect()
}

/// Sanitize a JSON value; anything other than a string yields an empty string
pub fn sanitize_value(value: &Value) -> String {
    value.as_str().map(sanitize_text).unwrap_or_default()
}

/// Last sentence of a message, used for the response preview
///
/// Falls back to the last non-blank line when the text has no sentence
/// punctuation, and to the trimmed text when it has no non-blank lines.
pub fn extract_last_sentence(text: &str) -> String {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return String::new();
    }

    if let Some(last) = SENTENCE_RE.find_iter(cleaned).last() {
        return last.as_str().trim().to_string();
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or(cleaned)
        .to_string()
}

/// File-name slug for a conversation title
///
/// Whitespace runs become `_`, everything outside `[A-Za-z0-9_-]` is dropped
/// and the result is capped at 50 characters. Empty slugs become `chat`.
pub fn slugify_title(title: &str) -> String {
    let mut slug = String::new();
    let mut in_space = false;
    for c in title.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        }
    }

    let slug: String = slug.chars().take(50).collect();
    if slug.is_empty() {
        "chat".to_string()
    } else {
        slug
    }
}
