// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Offline conversion commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::colors::{count, Status, StyledText};
use crate::config::MigratorConfig;
use crate::memory::{convert_memory_file, MemoryMode};
use crate::providers::{ConversionContext, ProviderRegistry};
use crate::sql::{parse_tags, sql_from_paths};
use crate::storage::write_text;

/// Options for `migrator convert`
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub provider: String,
    pub user_id: String,
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub memory_mode: MemoryMode,
}

/// Write `sql` to `output`, or print it when no file is given
fn emit_sql(sql: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_text(sql, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Wrote {}", Status::ok(), path.display().to_string().path());
        }
        None => println!("{}", sql),
    }
    Ok(())
}

/// Convert an export to JSON records and SQL scripts
pub fn convert(config: &MigratorConfig, options: &ConvertOptions) -> Result<()> {
    let registry = ProviderRegistry::with_defaults();
    let provider = registry.create(&options.provider)?;

    let mut ctx = ConversionContext::for_provider(config, provider.name(), &options.user_id);
    if let Some(dir) = &options.data_dir {
        ctx.data_dir = dir.clone();
    }
    if let Some(dir) = &options.output_dir {
        ctx.output_dir = dir.clone();
    }

    provider.validate_data_files(&ctx.data_dir)?;

    if let Some(outcome) = provider
        .convert_conversations(&ctx)
        .with_context(|| format!("Failed to convert {} conversations", provider.display_name()))?
    {
        println!(
            "{} Converted {} conversations into {}",
            Status::ok(),
            count(outcome.conversations.len()),
            ctx.output_dir.display().to_string().path()
        );
        if outcome.stats.total_assets() > 0 {
            println!(
                "{} {} attachments ({} images, {} AI-generated to sync)",
                Status::info(),
                count(outcome.stats.total_assets()),
                count(outcome.stats.total_images()),
                count(outcome.media.len())
            );
        }
        if outcome.stats.skipped_conversations > 0 {
            println!(
                "{} Skipped {} malformed conversations",
                Status::warn(),
                outcome.stats.skipped_conversations
            );
        }

        let sql = outcome.to_sql(&[provider.name().to_string()])?;
        emit_sql(&sql, Some(&config.conversations_sql))?;
    }

    if let Some(memory) = provider.convert_memory(&ctx, options.memory_mode)? {
        println!(
            "{} Converted {} memory entries",
            Status::ok(),
            count(memory.entries)
        );
        emit_sql(&memory.sql, Some(&config.memory_sql))?;
    }

    Ok(())
}

/// Generate chat SQL from converted JSON
pub fn generate_sql(paths: &[String], tags: Option<&str>, output: Option<&str>) -> Result<()> {
    let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
    let tags = parse_tags(tags.unwrap_or_default());

    let sql = sql_from_paths(&paths, &tags)?;
    emit_sql(&sql, output.map(Path::new))
}

/// Generate memory SQL from a notes file
pub fn generate_memory_sql(
    file: &str,
    user_id: &str,
    mode: MemoryMode,
    output: Option<&str>,
) -> Result<()> {
    let (sql, entries) = convert_memory_file(Path::new(file), user_id, mode)?;
    if output.is_some() {
        println!(
            "{} Converted {} memory entries",
            Status::ok(),
            count(entries)
        );
    }
    emit_sql(&sql, output.map(Path::new))
}
