// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! CLI argument definitions using clap derive macros

use clap::{Parser, Subcommand};

/// Open WebUI migrator - Move ChatGPT exports into Open WebUI
#[derive(Parser)]
#[command(name = "migrator")]
#[command(author = "Nervosys")]
#[command(version)]
#[command(
    about = "Migrate ChatGPT conversations, images and memory into Open WebUI",
    long_about = None
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    // ============================================================================
    // Migration
    // ============================================================================
    /// Run the full migration against the Open WebUI container
    Migrate {
        /// Provider to migrate (default: every provider with a data folder)
        #[arg(short, long)]
        provider: Option<String>,

        /// User that will own the migrated data
        #[arg(long, env = "USER_ID")]
        user_id: Option<String>,

        /// Replace existing memories instead of merging
        #[arg(long)]
        replace_memory: bool,

        /// Keep the local database, SQL and converted JSON afterwards
        #[arg(long)]
        keep_artifacts: bool,

        /// Open WebUI container name
        #[arg(long, env = "MIGRATOR_CONTAINER")]
        container: Option<String>,
    },

    // ============================================================================
    // Offline Conversion
    // ============================================================================
    /// Convert an export to Open WebUI JSON and SQL without touching the container
    Convert {
        /// Provider of the export
        #[arg(short, long, default_value = "chatgpt")]
        provider: String,

        /// User that will own the migrated data
        #[arg(long, env = "USER_ID")]
        user_id: String,

        /// Folder holding the export (default: data/<provider>)
        #[arg(long)]
        data: Option<String>,

        /// Folder receiving converted JSON (default: output/<provider>)
        #[arg(long)]
        out: Option<String>,

        /// Replace existing memories instead of merging
        #[arg(long)]
        replace_memory: bool,
    },

    /// Generate chat SQL from converted JSON files or folders
    Sql {
        /// JSON files or folders of JSON files
        #[arg(required = true)]
        paths: Vec<String>,

        /// Comma-separated tags to apply (default: imported)
        #[arg(short, long)]
        tags: Option<String>,

        /// Write SQL to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Generate memory SQL from a notes file
    Memory {
        /// Notes file with one memory per paragraph
        file: String,

        /// User that will own the memories
        #[arg(long, env = "USER_ID", default_value = "user")]
        user_id: String,

        /// Replace existing memories instead of merging
        #[arg(long)]
        replace: bool,

        /// Write SQL to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    // ============================================================================
    // Inspection
    // ============================================================================
    /// List supported providers and their expected files
    Providers,

    /// List users in a local Open WebUI database
    Users {
        /// Database file (default: webui.db)
        #[arg(long)]
        db: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sql_command() {
        let cli = Cli::try_parse_from(["migrator", "sql", "output/chatgpt", "--tags", "a,b"])
            .unwrap();
        match cli.command {
            Commands::Sql { paths, tags, output } => {
                assert_eq!(paths, vec!["output/chatgpt"]);
                assert_eq!(tags.as_deref(), Some("a,b"));
                assert!(output.is_none());
            }
            _ => panic!("expected sql command"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["migrator", "providers", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
