// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Provider and user listings

use anyhow::Result;
use std::path::Path;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use crate::colors::{count, Status, StyledText};
use crate::config::MigratorConfig;
use crate::database::{users_table, WebUiDatabase};
use crate::providers::ProviderRegistry;

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "Provider")]
    name: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Data Folder")]
    folder: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Optional")]
    optional: String,
    #[tabled(rename = "Data")]
    status: String,
}

/// List supported providers
pub fn list_providers(config: &MigratorConfig) -> Result<()> {
    let registry = ProviderRegistry::with_defaults();
    let rows: Vec<ProviderRow> = registry
        .providers()
        .iter()
        .map(|provider| {
            let folder = config.provider_data_path(provider.name());
            let status = if folder.is_dir() { "found" } else { "-" };
            ProviderRow {
                name: provider.name().to_string(),
                display_name: format!("{} ({})", provider.display_name(), provider.description()),
                folder: folder.display().to_string(),
                required: provider.required_files().join(", "),
                optional: provider.optional_files().join(", "),
                status: status.to_string(),
            }
        })
        .collect();

    println!("{}", "Supported providers".header());
    println!(
        "{}",
        Table::new(rows).with(TableStyle::ascii_rounded())
    );
    Ok(())
}

/// List users in a local database
pub fn list_users(config: &MigratorConfig, db: Option<&str>) -> Result<()> {
    let path = db.map(Path::new).unwrap_or(config.local_db.as_path());
    let database = WebUiDatabase::open(path)?;
    let users = database.users()?;

    if users.is_empty() {
        println!("{} No users found in {}", Status::warn(), path.display());
        return Ok(());
    }

    println!(
        "{} {} users in {}",
        Status::info(),
        count(users.len()),
        path.display().to_string().path()
    );
    println!("{}", users_table(&users));
    Ok(())
}
