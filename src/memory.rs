// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Memory notes conversion
//!
//! ChatGPT's saved memories export as a plain text file with one note per
//! paragraph. Each note becomes a row of Open WebUI's `memory` table.

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use uuid::Uuid;

use crate::error::{MigratorError, Result};
use crate::sql::escape_sql;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Notes shorter than this are dropped
pub const MIN_ENTRY_LEN: usize = 11;

/// How memory rows are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryMode {
    /// Delete the user's memories, then insert
    Replace,
    /// Insert only notes the user does not already have
    #[default]
    Merge,
}

impl MemoryMode {
    pub fn from_replace_flag(replace: bool) -> Self {
        if replace {
            Self::Replace
        } else {
            Self::Merge
        }
    }
}

/// Collapse whitespace runs to single spaces and trim
fn normalize_entry(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

/// Split notes text into entries on blank lines
pub fn parse_memory_text(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(normalize_entry)
        .filter(|entry| entry.chars().count() >= MIN_ENTRY_LEN)
        .collect()
}

/// Read and split a notes file
pub fn parse_memory_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MigratorError::FileOperation(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(parse_memory_text(&content))
}

/// SQL inserting `entries` for `user_id`
pub fn create_memory_sql(entries: &[String], user_id: &str, mode: MemoryMode) -> String {
    let now = Utc::now().timestamp();
    let user = escape_sql(user_id);

    let mut lines = vec![
        "-- Memory entries for open-webui".to_string(),
        format!("-- Generated at: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        String::new(),
    ];

    match mode {
        MemoryMode::Replace => {
            lines.push(format!("-- Clear existing memories for user {}", user));
            lines.push(format!("DELETE FROM memory WHERE user_id = '{}';", user));
            lines.push(String::new());
        }
        MemoryMode::Merge => {
            lines.push("-- Skipping duplicate memories based on content".to_string());
            lines.push(String::new());
        }
    }

    for (i, entry) in entries.iter().enumerate() {
        let id = Uuid::new_v4();
        let content = escape_sql(entry);
        let statement = match mode {
            MemoryMode::Replace => format!(
                "-- Memory {}\n\
                 INSERT INTO memory (id, user_id, content, created_at, updated_at)\n\
                 VALUES ('{}', '{}', '{}', {}, {});",
                i + 1,
                id,
                user,
                content,
                now,
                now
            ),
            MemoryMode::Merge => format!(
                "-- Memory {}\n\
                 INSERT INTO memory (id, user_id, content, created_at, updated_at)\n\
                 SELECT '{}', '{}', '{}', {}, {}\n\
                 WHERE NOT EXISTS (\n    \
                 SELECT 1 FROM memory\n    \
                 WHERE user_id = '{}'\n    \
                 AND content = '{}'\n\
                 );",
                i + 1,
                id,
                user,
                content,
                now,
                now,
                user,
                content
            ),
        };
        lines.push(statement);
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Parse a notes file and render its SQL; no entries is an error
pub fn convert_memory_file(path: &Path, user_id: &str, mode: MemoryMode) -> Result<(String, usize)> {
    let entries = parse_memory_file(path)?;
    if entries.is_empty() {
        return Err(MigratorError::EmptyInput(format!(
            "no memories found in {}",
            path.display()
        )));
    }
    log::info!("Parsed {} memory entries for user {}", entries.len(), user_id);
    Ok((create_memory_sql(&entries, user_id, mode), entries.len()))
}
