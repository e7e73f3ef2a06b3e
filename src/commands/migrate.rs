// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Full migration into a running Open WebUI container

use anyhow::{Context, Result};

use crate::colors::{count, Status, StyledText};
use crate::config::MigratorConfig;
use crate::database::{UserSelector, WebUiDatabase};
use crate::docker::{ContainerTransport, DatabaseSync, DockerCli, ImageSync};
use crate::error::MigratorError;
use crate::memory::MemoryMode;
use crate::models::ConversionStats;
use crate::providers::{ConversionContext, MigrationProvider, ProviderRegistry};
use crate::storage::{clean_artifacts, write_text};

/// Options for `migrator migrate`
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub provider: Option<String>,
    pub user_id: Option<String>,
    pub memory_mode: MemoryMode,
    pub keep_artifacts: bool,
}

/// Totals reported once the migration finishes
#[derive(Debug, Default)]
struct MigrationSummary {
    providers: Vec<String>,
    conversations: usize,
    memories: usize,
    statements: usize,
    images_copied: usize,
    images_failed: usize,
    stats: ConversionStats,
}

/// Providers to migrate: the requested one, or every provider with a data folder
fn select_providers(
    registry: &ProviderRegistry,
    config: &MigratorConfig,
    requested: Option<&str>,
) -> Result<Vec<Box<dyn MigrationProvider>>> {
    if let Some(name) = requested {
        return Ok(vec![registry.create(name)?]);
    }

    let providers: Vec<_> = registry
        .providers()
        .into_iter()
        .filter(|p| config.provider_data_path(p.name()).is_dir())
        .collect();

    if providers.is_empty() {
        return Err(MigratorError::FileOperation(format!(
            "No provider data found under {}. Expected one of: {}",
            config.data_dir.display(),
            registry.supported().join(", ")
        ))
        .into());
    }
    Ok(providers)
}

/// Run the full migration
pub fn migrate(config: &MigratorConfig, options: &MigrateOptions) -> Result<()> {
    let registry = ProviderRegistry::with_defaults();
    let providers = select_providers(&registry, config, options.provider.as_deref())?;

    for provider in &providers {
        println!(
            "{} Validating {} data files...",
            Status::action(),
            provider.display_name()
        );
        provider.validate_data_files(&config.provider_data_path(provider.name()))?;
    }

    let docker = DockerCli::new(config.container_name.clone());
    if !docker.exists()? {
        return Err(MigratorError::ContainerNotFound(config.container_name.clone()).into());
    }

    if !docker.is_running()? {
        log::info!("{} is not running, it will be started afterwards", docker.container_name());
    }

    docker.stop()?;
    let result = migrate_stopped(config, options, &providers, &docker);
    let restarted = docker.start_and_verify();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            if let Err(start_err) = restarted {
                log::error!("Could not restart {}: {}", docker.container_name(), start_err);
            }
            return Err(e);
        }
    };
    restarted.context("Migration finished but the container failed to start")?;

    if options.keep_artifacts {
        println!("{} Keeping migration artifacts", Status::info());
    } else {
        for removed in clean_artifacts(&config.artifacts_to_clean()) {
            log::info!("Removed {}", removed.display());
        }
    }

    print_summary(&summary);
    Ok(())
}

/// Steps that run while the container is stopped
fn migrate_stopped(
    config: &MigratorConfig,
    options: &MigrateOptions,
    providers: &[Box<dyn MigrationProvider>],
    docker: &dyn ContainerTransport,
) -> Result<MigrationSummary> {
    DatabaseSync::new(docker, &config.container_db_path).pull(&config.local_db)?;

    let mut db = WebUiDatabase::open(&config.local_db)?;
    db.create_backup(&config.local_db_backup)?;
    db.validate_schema()?;

    let configured = options.user_id.as_deref().or(config.user_id.as_deref());
    let user_id = UserSelector::new(&db).resolve(configured)?;

    let mut summary = MigrationSummary::default();
    let mut media = Vec::new();

    for provider in providers {
        println!(
            "{} Migrating {} data for user {}",
            Status::action(),
            provider.display_name(),
            user_id.path()
        );
        let ctx = ConversionContext::for_provider(config, provider.name(), &user_id);
        summary.providers.push(provider.display_name().to_string());

        if let Some(outcome) = provider.convert_conversations(&ctx)? {
            let sql = outcome.to_sql(&[provider.name().to_string()])?;
            write_text(&sql, &config.conversations_sql)?;
            summary.statements += db
                .execute_sql_file(&config.conversations_sql)
                .context("Failed to import conversations")?;

            summary.conversations += outcome.conversations.len();
            summary.stats.merge(&outcome.stats);
            media.extend(outcome.media);
        }

        if let Some(memory) = provider.convert_memory(&ctx, options.memory_mode)? {
            write_text(&memory.sql, &config.memory_sql)?;
            summary.statements += db
                .execute_sql_file(&config.memory_sql)
                .context("Failed to import memories")?;
            summary.memories += memory.entries;
        }
    }

    drop(db);
    DatabaseSync::new(docker, &config.container_db_path).push(&config.local_db)?;

    let (copied, failed) =
        ImageSync::new(docker, &config.container_uploads_path).sync_images(&media);
    summary.images_copied = copied;
    summary.images_failed = failed;

    Ok(summary)
}

fn print_summary(summary: &MigrationSummary) {
    println!();
    println!("{}", "Migration complete".header());
    println!(
        "{} Providers:      {}",
        Status::summary(),
        summary.providers.join(", ")
    );
    println!(
        "{} Conversations:  {}",
        Status::summary(),
        count(summary.conversations)
    );
    println!("{} Memories:       {}", Status::summary(), count(summary.memories));
    println!(
        "{} SQL statements: {}",
        Status::summary(),
        count(summary.statements)
    );
    println!(
        "{} Attachments:    {} ({} images)",
        Status::summary(),
        count(summary.stats.total_assets()),
        count(summary.stats.total_images())
    );
    println!(
        "{} Images synced:  {}",
        Status::summary(),
        count(summary.images_copied)
    );

    if summary.images_failed > 0 || summary.stats.assets.images_missing > 0 {
        println!(
            "{} {} images missing from the export, {} failed to copy",
            Status::warn(),
            summary.stats.assets.images_missing,
            summary.images_failed
        );
    }
    println!("{} {}", Status::ok(), "Open WebUI is running again".success());
}
