// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Migrator configuration
//!
//! Defaults match a stock Open WebUI docker deployment. Values can be
//! overridden through the environment (optionally from a `.env` file) and
//! then through command-line flags.

use std::path::{Path, PathBuf};

use crate::models::ModelRef;

/// Environment variable holding the owning user id
pub const USER_ID_ENV_VAR: &str = "USER_ID";
/// Environment variable overriding the container name
pub const CONTAINER_ENV_VAR: &str = "MIGRATOR_CONTAINER";
/// Environment variable overriding the data root
pub const DATA_DIR_ENV_VAR: &str = "MIGRATOR_DATA_DIR";
/// Environment variable overriding the output root
pub const OUTPUT_DIR_ENV_VAR: &str = "MIGRATOR_OUTPUT_DIR";

/// Fallback model id used when an export names no model
pub const DEFAULT_MODEL_ID: &str = "openai-chatgpt-4o";
/// Display name paired with [`DEFAULT_MODEL_ID`]
pub const DEFAULT_MODEL_NAME: &str = "ChatGPT 4o";

/// Global migrator configuration
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Docker container running Open WebUI
    pub container_name: String,
    /// Database path inside the container
    pub container_db_path: String,
    /// Uploads directory inside the container
    pub container_uploads_path: String,
    /// Local working copy of the database
    pub local_db: PathBuf,
    /// Backup of the pulled database
    pub local_db_backup: PathBuf,
    /// Generated chat SQL
    pub conversations_sql: PathBuf,
    /// Generated memory SQL
    pub memory_sql: PathBuf,
    /// Root holding one folder per provider (`data/chatgpt`, ...)
    pub data_dir: PathBuf,
    /// Root for converted JSON (`output/chatgpt`, ...)
    pub output_dir: PathBuf,
    /// Model used when a conversation names none
    pub default_model: ModelRef,
    /// Fixed owning user, skips interactive selection
    pub user_id: Option<String>,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            container_name: "open-webui".to_string(),
            container_db_path: "/app/backend/data/webui.db".to_string(),
            container_uploads_path: "/app/backend/data/uploads".to_string(),
            local_db: PathBuf::from("webui.db"),
            local_db_backup: PathBuf::from("webui.db.backup"),
            conversations_sql: PathBuf::from("conversations.sql"),
            memory_sql: PathBuf::from("memory.sql"),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            default_model: ModelRef::new(DEFAULT_MODEL_ID, DEFAULT_MODEL_NAME),
            user_id: None,
        }
    }
}

impl MigratorConfig {
    /// Build a configuration from defaults, `.env` and process environment
    pub fn from_env() -> Self {
        // A missing .env file is the normal case
        let _ = dotenvy::dotenv();
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an environment lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(user_id) = non_empty(USER_ID_ENV_VAR) {
            self.user_id = Some(user_id.trim().to_string());
        }
        if let Some(container) = non_empty(CONTAINER_ENV_VAR) {
            self.container_name = container;
        }
        if let Some(dir) = non_empty(DATA_DIR_ENV_VAR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty(OUTPUT_DIR_ENV_VAR) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    /// Data folder for a provider (`data/<provider>`)
    pub fn provider_data_path(&self, provider: &str) -> PathBuf {
        self.data_dir.join(provider)
    }

    /// Output folder for a provider (`output/<provider>`)
    pub fn provider_output_path(&self, provider: &str) -> PathBuf {
        self.output_dir.join(provider)
    }

    /// Files and folders removed after a successful migration
    pub fn artifacts_to_clean(&self) -> Vec<&Path> {
        vec![
            self.output_dir.as_path(),
            self.local_db.as_path(),
            self.conversations_sql.as_path(),
            self.memory_sql.as_path(),
        ]
    }
}
