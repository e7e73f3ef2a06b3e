// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! File storage for converted records and generated SQL

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MigratorError, Result};
use crate::models::BuiltConversation;
use crate::text::slugify_title;

/// File name for a converted conversation: `{slug}_{id}.json`
pub fn conversation_file_name(title: &str, id: &str) -> String {
    let id: String = id
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{}_{}.json", slugify_title(title), id)
}

/// Write `value` as pretty-printed JSON, creating parent folders
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).map_err(|e| {
        MigratorError::FileOperation(format!("Failed to write {}: {}", path.display(), e))
    })
}

/// Read a JSON document
pub fn load_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(MigratorError::FileOperation(format!(
            "JSON file not found: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write text, creating parent folders
pub fn write_text(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).map_err(|e| {
        MigratorError::FileOperation(format!("Failed to write {}: {}", path.display(), e))
    })
}

/// Write one JSON file per conversation into `out_dir`
pub fn write_conversations(built: &[BuiltConversation], out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(built.len());
    for conversation in built {
        let record = &conversation.record;
        let path = out_dir.join(conversation_file_name(&record.title, &record.id));
        save_json(record, &path)?;
        log::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Remove a file or folder if present
pub fn remove_path(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}

/// Remove every artifact, reporting the ones removed
pub fn clean_artifacts(paths: &[&Path]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| match remove_path(path) {
            Ok(true) => Some(path.to_path_buf()),
            Ok(false) => None,
            Err(e) => {
                log::warn!("Could not remove {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}
