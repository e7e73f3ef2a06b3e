// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Error types for the migrator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigratorError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Docker error: {0}")]
    Docker(String),

    #[error("File operation failed: {0}")]
    FileOperation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Container is not running: {0}")]
    ContainerNotRunning(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("User selection failed: {0}")]
    UserSelection(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("No conversation ID found for conversation: {0}")]
    MissingConversationId(String),

    #[error("Nothing to migrate: {0}")]
    EmptyInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl MigratorError {
    /// Process exit code for this error when it reaches `main`
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Json(_) | Self::Configuration(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigratorError>;
