// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Open WebUI migrator - Library
//!
//! Converts ChatGPT data exports (conversations, uploaded and generated
//! images, saved memories) into Open WebUI chat records and SQL, and applies
//! them to a running Open WebUI instance.
//!
//! ## Supported Providers
//!
//! - **ChatGPT** - `conversations.json` and `memory.txt` from the data export
//!
//! ## Conversion
//!
//! ```rust,ignore
//! use migrator::config::MigratorConfig;
//! use migrator::providers::{ConversionContext, ProviderRegistry};
//!
//! let config = MigratorConfig::from_env();
//! let provider = ProviderRegistry::with_defaults().create("chatgpt")?;
//! let ctx = ConversionContext::for_provider(&config, provider.name(), "user-1");
//! if let Some(outcome) = provider.convert_conversations(&ctx)? {
//!     let sql = outcome.to_sql(&["chatgpt".to_string()])?;
//! }
//! ```

pub mod builder;
pub mod cli;
pub mod colors;
pub mod commands;
pub mod config;
pub mod database;
pub mod docker;
pub mod error;
pub mod memory;
pub mod models;
pub mod providers;
pub mod sql;
pub mod storage;
pub mod text;

pub use error::{MigratorError, Result};
pub use providers::{ConversionContext, MigrationProvider, ProviderRegistry};
