// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Migration providers
//!
//! Each provider knows the files of its export and how to turn them into
//! Open WebUI chat records and memory SQL.
//!
//! ## Supported Providers
//! - ChatGPT (OpenAI) data export

pub mod chatgpt;

pub use chatgpt::ChatGptProvider;

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::MigratorConfig;
use crate::error::{MigratorError, Result};
use crate::memory::MemoryMode;
use crate::models::{BuiltConversation, ConversionStats, MediaCopy, ModelRef};
use crate::sql::build_conversations_sql;

/// Everything a conversion needs, passed in explicitly
#[derive(Debug, Clone)]
pub struct ConversionContext {
    /// Folder holding the provider export
    pub data_dir: PathBuf,
    /// Folder receiving converted JSON
    pub output_dir: PathBuf,
    /// Owner of the migrated data
    pub user_id: String,
    /// Model used when the export names none
    pub default_model: ModelRef,
}

impl ConversionContext {
    /// Context for `provider` under the configured data and output roots
    pub fn for_provider(config: &MigratorConfig, provider: &str, user_id: &str) -> Self {
        Self {
            data_dir: config.provider_data_path(provider),
            output_dir: config.provider_output_path(provider),
            user_id: user_id.to_string(),
            default_model: config.default_model.clone(),
        }
    }
}

/// Result of converting an export's conversations
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub conversations: Vec<BuiltConversation>,
    pub written: Vec<PathBuf>,
    pub media: Vec<MediaCopy>,
    pub stats: ConversionStats,
}

impl ConversionOutcome {
    /// Chat SQL for the converted records
    pub fn to_sql(&self, tags: &[String]) -> Result<String> {
        let records = self
            .conversations
            .iter()
            .map(|c| serde_json::to_value(&c.record))
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        build_conversations_sql(&records, tags)
    }
}

/// Result of converting an export's memory notes
#[derive(Debug, Clone)]
pub struct MemoryOutcome {
    pub sql: String,
    pub entries: usize,
}

/// A source of chat exports
pub trait MigrationProvider {
    /// Registry key and data folder name
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Files the export is expected to contain
    fn required_files(&self) -> &'static [&'static str];

    fn optional_files(&self) -> &'static [&'static str];

    /// Check the data folder, returning the export files present
    fn validate_data_files(&self, data_dir: &Path) -> Result<Vec<PathBuf>>;

    /// Convert conversations; `None` when the export has none
    fn convert_conversations(&self, ctx: &ConversionContext) -> Result<Option<ConversionOutcome>>;

    /// Convert memory notes; `None` when the export has none
    fn convert_memory(
        &self,
        ctx: &ConversionContext,
        mode: MemoryMode,
    ) -> Result<Option<MemoryOutcome>>;
}

/// Builds a provider instance
pub type ProviderFactory = fn() -> Box<dyn MigrationProvider>;

/// Registry of providers by name
pub struct ProviderRegistry {
    factories: Vec<(String, ProviderFactory)>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Registry with the built-in providers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("chatgpt", || Box::new(ChatGptProvider::new()));
        registry
    }

    /// Add or replace a provider
    pub fn register(&mut self, name: &str, factory: ProviderFactory) {
        match self.factories.iter_mut().find(|(known, _)| known == name) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((name.to_string(), factory)),
        }
    }

    /// Instantiate a provider by name
    pub fn create(&self, name: &str) -> Result<Box<dyn MigrationProvider>> {
        self.factories
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, factory)| factory())
            .ok_or_else(|| MigratorError::UnsupportedProvider(name.to_string()))
    }

    /// Provider names in registration order
    pub fn supported(&self) -> Vec<&str> {
        self.factories.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Instances of every registered provider
    pub fn providers(&self) -> Vec<Box<dyn MigrationProvider>> {
        self.factories.iter().map(|(_, factory)| factory()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
