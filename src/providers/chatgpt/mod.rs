// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! ChatGPT data export provider
//!
//! ## Export layout
//!
//! - `conversations.json` - every conversation with its message tree
//! - `file-*` - images uploaded by the user
//! - `dalle-generations/` - images produced by the generation tool
//! - `memory.txt` - saved memories, one per paragraph (optional)

pub mod attachments;
pub mod content;
pub mod export;
pub mod models;
pub mod walker;

pub use attachments::AttachmentResolver;
pub use export::{parse_timestamp, ExportConversation};
pub use models::normalize_model;
pub use walker::ExportParser;

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::{ConversionContext, ConversionOutcome, MemoryOutcome, MigrationProvider};
use crate::builder::{build_conversation, media_to_copy};
use crate::error::{MigratorError, Result};
use crate::memory::{convert_memory_file, MemoryMode};
use crate::storage::{load_json, write_conversations};

pub const CONVERSATIONS_FILE: &str = "conversations.json";
pub const MEMORY_FILE: &str = "memory.txt";

/// ChatGPT export provider
#[derive(Debug, Clone, Default)]
pub struct ChatGptProvider;

impl ChatGptProvider {
    pub fn new() -> Self {
        Self
    }

    /// Convert an already loaded export and write the records
    pub fn convert_export(&self, data: &Value, ctx: &ConversionContext) -> Result<ConversionOutcome> {
        let parser = ExportParser::new(
            AttachmentResolver::new(&ctx.data_dir),
            ctx.default_model.clone(),
        );
        let (parsed, mut stats) = parser.parse_export(data);

        let mut conversations = Vec::with_capacity(parsed.len());
        for conversation in &parsed {
            match build_conversation(conversation, Some(&ctx.user_id)) {
                Ok(built) => conversations.push(built),
                Err(e) => {
                    log::warn!("Skipping conversation '{}': {}", conversation.title, e);
                    stats.skipped_conversations += 1;
                }
            }
        }

        if conversations.is_empty() {
            return Err(MigratorError::EmptyInput(
                "no conversations found in the export".to_string(),
            ));
        }

        let written = write_conversations(&conversations, &ctx.output_dir)?;
        let media = media_to_copy(
            conversations
                .iter()
                .flat_map(|c| c.files_with_metadata.iter()),
        );

        log::info!(
            "Converted {} conversations to {}",
            conversations.len(),
            ctx.output_dir.display()
        );

        Ok(ConversionOutcome {
            conversations,
            written,
            media,
            stats,
        })
    }
}

impl MigrationProvider for ChatGptProvider {
    fn name(&self) -> &'static str {
        "chatgpt"
    }

    fn display_name(&self) -> &'static str {
        "ChatGPT"
    }

    fn description(&self) -> &'static str {
        "Export from ChatGPT settings"
    }

    fn required_files(&self) -> &'static [&'static str] {
        &[CONVERSATIONS_FILE]
    }

    fn optional_files(&self) -> &'static [&'static str] {
        &[MEMORY_FILE]
    }

    fn validate_data_files(&self, data_dir: &Path) -> Result<Vec<PathBuf>> {
        let found: Vec<PathBuf> = [CONVERSATIONS_FILE, MEMORY_FILE]
            .iter()
            .map(|name| data_dir.join(name))
            .filter(|path| path.exists())
            .collect();

        if found.is_empty() {
            return Err(MigratorError::FileOperation(format!(
                "No data files found in {}. Please add {} and/or {} files",
                data_dir.display(),
                CONVERSATIONS_FILE,
                MEMORY_FILE
            )));
        }
        for path in &found {
            log::info!("Found data file: {}", path.display());
        }
        Ok(found)
    }

    fn convert_conversations(&self, ctx: &ConversionContext) -> Result<Option<ConversionOutcome>> {
        let path = ctx.data_dir.join(CONVERSATIONS_FILE);
        if !path.exists() {
            log::info!("No {} found, skipping conversation conversion", CONVERSATIONS_FILE);
            return Ok(None);
        }

        log::info!("Converting ChatGPT conversations for user: {}", ctx.user_id);
        let data = load_json(&path)?;
        self.convert_export(&data, ctx).map(Some)
    }

    fn convert_memory(
        &self,
        ctx: &ConversionContext,
        mode: MemoryMode,
    ) -> Result<Option<MemoryOutcome>> {
        let path = ctx.data_dir.join(MEMORY_FILE);
        if !path.exists() {
            log::info!("No {} found, skipping memory conversion", MEMORY_FILE);
            return Ok(None);
        }

        let (sql, entries) = convert_memory_file(&path, &ctx.user_id, mode)?;
        Ok(Some(MemoryOutcome { sql, entries }))
    }
}
