// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! ChatGPT model slug normalization

use crate::models::ModelRef;

/// Known slugs and their Open WebUI id and display name
const KNOWN_MODELS: &[(&str, &str, &str)] = &[
    ("gpt-4", "openai-gpt-4", "GPT-4"),
    ("gpt-4o", "openai-gpt-4o", "GPT-4o"),
    ("gpt-4o-jawboned", "openai-gpt-4o", "GPT-4o"),
    ("gpt-4o-canmore", "openai-gpt-4o", "GPT-4o"),
    ("gpt-4o-mini", "openai-gpt-4o-mini", "GPT-4o mini"),
    ("gpt-4-1", "openai-gpt-4.1", "GPT-4.1"),
    ("gpt-4.1-mini", "openai-gpt-4.1-mini", "GPT-4.1 mini"),
    ("gpt-4.1-nano", "openai-gpt-4.1-nano", "GPT-4.1 nano"),
    ("gpt-4-5", "openai-gpt-4.5-preview", "GPT-4.5 Preview"),
    ("gpt-3.5-turbo", "openai-gpt-3.5", "GPT-3.5"),
    ("o1-preview", "openai-o1-preview", "o1-preview"),
    ("o1-mini", "openai-o1-mini", "o1-mini"),
    ("o3-mini", "openai-o3-mini", "o3-mini"),
    ("o3-mini-high", "openai-o3-mini-high", "o3-mini-high"),
    ("o3", "openai-o3", "o3"),
    ("o4-mini", "openai-o4-mini", "o4-mini"),
    ("o4-mini-high", "openai-o4-mini-high", "o4-mini-high"),
];

/// Map a ChatGPT model slug to an Open WebUI model
///
/// Unknown `gpt-*` slugs keep their slug with an uppercased display name,
/// unknown reasoning slugs (`o<digit>...`) keep it verbatim, and anything
/// else resolves to `default`.
pub fn normalize_model(slug: &str, default: &ModelRef) -> ModelRef {
    if let Some((_, id, name)) = KNOWN_MODELS.iter().find(|(known, _, _)| *known == slug) {
        return ModelRef::new(*id, *name);
    }

    if slug.starts_with("gpt-") {
        return ModelRef::new(format!("openai-{}", slug), slug.to_uppercase());
    }

    if is_reasoning_slug(slug) {
        return ModelRef::new(format!("openai-{}", slug), slug);
    }

    default.clone()
}

fn is_reasoning_slug(slug: &str) -> bool {
    let mut chars = slug.chars();
    chars.next() == Some('o') && chars.next().is_some_and(|c| c.is_ascii_digit())
}
