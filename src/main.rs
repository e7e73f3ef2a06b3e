// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Open WebUI migrator - Main entry point

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use migrator::cli::{Cli, Commands};
use migrator::colors::Status;
use migrator::commands::{self, ConvertOptions, MigrateOptions};
use migrator::config::MigratorConfig;
use migrator::memory::MemoryMode;
use migrator::MigratorError;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli, config: MigratorConfig) -> anyhow::Result<()> {
    match cli.command {
        // ====================================================================
        // Migration
        // ====================================================================
        Commands::Migrate {
            provider,
            user_id,
            replace_memory,
            keep_artifacts,
            container,
        } => {
            let mut config = config;
            if let Some(container) = container {
                config.container_name = container;
            }
            let options = MigrateOptions {
                provider,
                user_id,
                memory_mode: MemoryMode::from_replace_flag(replace_memory),
                keep_artifacts,
            };
            commands::migrate(&config, &options)
        }

        // ====================================================================
        // Offline Conversion
        // ====================================================================
        Commands::Convert {
            provider,
            user_id,
            data,
            out,
            replace_memory,
        } => {
            let options = ConvertOptions {
                provider,
                user_id,
                data_dir: data.map(PathBuf::from),
                output_dir: out.map(PathBuf::from),
                memory_mode: MemoryMode::from_replace_flag(replace_memory),
            };
            commands::convert(&config, &options)
        }
        Commands::Sql {
            paths,
            tags,
            output,
        } => commands::generate_sql(&paths, tags.as_deref(), output.as_deref()),
        Commands::Memory {
            file,
            user_id,
            replace,
            output,
        } => commands::generate_memory_sql(
            &file,
            &user_id,
            MemoryMode::from_replace_flag(replace),
            output.as_deref(),
        ),

        // ====================================================================
        // Inspection
        // ====================================================================
        Commands::Providers => commands::list_providers(&config),
        Commands::Users { db } => commands::list_users(&config, db.as_deref()),
    }
}

/// Exit code for a failed command
fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(e) = error.downcast_ref::<MigratorError>() {
        return e.exit_code() as u8;
    }
    if error.downcast_ref::<std::io::Error>().is_some() {
        return 2;
    }
    1
}

fn main() -> ExitCode {
    let config = MigratorConfig::from_env();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", Status::error(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}
