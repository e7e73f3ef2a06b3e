// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Chat SQL generation
//!
//! Converted chat records are stored as compact JSON in the `chat` table.
//! Each record becomes a delete/insert pair so re-running a migration
//! replaces rather than duplicates. Tags referenced by the records are
//! upserted first for every owning user.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{MigratorError, Result};

/// Tag applied when none is requested
pub const DEFAULT_TAG: &str = "imported";

/// Owner used when a record carries no `userId`
pub const DEFAULT_USER: &str = "user";

/// Tags every import user receives
const BASE_TAGS: &[&str] = &["imported-grok", "imported-chatgpt", "imported-claude"];

static TAG_INVALID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]+").expect("valid tag regex"));
static DASHES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid dash regex"));

/// Double single quotes for a SQL string literal
pub fn escape_sql(value: &str) -> String {
    value.replace('\'', "''")
}

/// JSON with every non-ASCII character escaped as `\uXXXX`
pub fn to_ascii_json(value: &Value) -> Result<String> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

/// Tag id for a tag name
pub fn tag_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = TAG_INVALID_RE.replace_all(&lowered, "-");
    DASHES_RE
        .replace_all(&replaced, "-")
        .trim_matches('-')
        .to_string()
}

/// Parse a comma-separated tag list, defaulting to [`DEFAULT_TAG`]
pub fn parse_tags(raw: &str) -> Vec<String> {
    let tags: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    if tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        tags
    }
}

/// Statements ensuring the base tags and `tags` exist for `user_id`
pub fn tag_upserts(user_id: &str, tags: &[String]) -> Vec<String> {
    let mut unique: Vec<(String, String)> = Vec::new();
    let requested = tags.iter().map(|t| (tag_slug(t), t.clone()));
    let base = BASE_TAGS.iter().map(|t| (t.to_string(), t.to_string()));

    for (id, name) in base.chain(requested) {
        match unique.iter_mut().find(|(known, _)| *known == id) {
            Some(entry) => entry.1 = name,
            None => unique.push((id, name)),
        }
    }

    let user = escape_sql(user_id);
    unique
        .into_iter()
        .map(|(id, name)| {
            format!(
                "INSERT INTO \"main\".\"tag\" (\"id\",\"name\",\"user_id\",\"meta\") \
                 VALUES ('{}','{}','{}','null') \
                 ON CONFLICT(\"id\",\"user_id\") DO UPDATE SET \"name\"=excluded.\"name\";",
                escape_sql(&id),
                escape_sql(&name),
                user
            )
        })
        .collect()
}

/// Delete/insert pair for one chat record, with its owning user
pub fn conversation_to_sql(
    record: &Value,
    tags: &[String],
    default_user: &str,
) -> Result<(String, String)> {
    let user_id = match record.get("userId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default_user.to_string(),
        Some(other) => other.to_string(),
    };

    let chat_json = escape_sql(&to_ascii_json(record)?);
    let title = escape_sql(record.get("title").and_then(Value::as_str).unwrap_or("Untitled"));
    let record_id = match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => Uuid::new_v4().to_string(),
    };

    let mut timestamp = record.get("timestamp").and_then(Value::as_i64).unwrap_or(0);
    if timestamp > 10_000_000_000 {
        timestamp /= 1000;
    }

    let meta = escape_sql(&to_ascii_json(&json!({ "tags": tags }))?);
    let record_id = escape_sql(&record_id);

    let sql = format!(
        "DELETE FROM \"main\".\"chat\" WHERE \"id\" = '{id}';\n\
         INSERT INTO \"main\".\"chat\" \
         (\"id\",\"user_id\",\"title\",\"share_id\",\"archived\",\"created_at\",\
         \"updated_at\",\"chat\",\"pinned\",\"meta\",\"folder_id\")\n\
         VALUES ('{id}','{user}','{title}',NULL,0,{ts},{ts},'{chat}',0,'{meta}',NULL);",
        id = record_id,
        user = escape_sql(&user_id),
        title = title,
        ts = timestamp,
        chat = chat_json,
        meta = meta,
    );

    Ok((sql, user_id))
}

/// Full script for a set of records: tag upserts per user, then the records
pub fn build_conversations_sql(records: &[Value], tags: &[String]) -> Result<String> {
    let mut users = BTreeSet::new();
    let mut inserts = Vec::with_capacity(records.len());

    for record in records {
        let (sql, user_id) = conversation_to_sql(record, tags, DEFAULT_USER)?;
        inserts.push(sql);
        users.insert(user_id);
    }

    let mut statements: Vec<String> = users
        .iter()
        .flat_map(|user| tag_upserts(user, tags))
        .collect();
    statements.extend(inserts);
    Ok(statements.join("\n"))
}

/// JSON files named by `paths`; directories contribute their `*.json` files
pub fn gather_json_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Records stored in one converted file: an object or an array of objects
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&content)?;
    match data {
        Value::Array(items) if items.is_empty() => Err(MigratorError::Validation(format!(
            "No conversations found in {}",
            path.display()
        ))),
        Value::Array(items) => Ok(items.into_iter().filter(Value::is_object).collect()),
        record @ Value::Object(_) => Ok(vec![record]),
        _ => Err(MigratorError::Validation(format!(
            "Invalid JSON format in {}",
            path.display()
        ))),
    }
}

/// SQL script for converted JSON files and folders
pub fn sql_from_paths(paths: &[PathBuf], tags: &[String]) -> Result<String> {
    let mut records = Vec::new();
    for file in gather_json_files(paths)? {
        let loaded = load_records(&file).map_err(|e| {
            MigratorError::Conversion(format!("Failed to process {}: {}", file.display(), e))
        })?;
        records.extend(loaded);
    }
    build_conversations_sql(&records, tags)
}
