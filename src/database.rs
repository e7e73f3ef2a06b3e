// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Open WebUI database access
//!
//! The migrator works on a local copy of the service's SQLite database.
//! Generated SQL scripts are applied through the [`SqlSink`] trait, which
//! [`WebUiDatabase`] implements over `rusqlite`.

use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tabled::{settings::Style as TableStyle, Table, Tabled};

use crate::error::{MigratorError, Result};

/// Tables a usable Open WebUI database must have
pub const REQUIRED_TABLES: &[&str] = &["user", "chat", "tag", "memory"];

/// Statements per transaction when applying scripts
pub const COMMIT_EVERY: usize = 100;

/// Accepts SQL scripts built by the converters
pub trait SqlSink {
    /// Execute a script of `;`-terminated statements, returning how many ran
    fn execute_script(&mut self, sql: &str) -> Result<usize>;
}

/// An Open WebUI account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebUiUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// Render users as a table, numbered from 1
pub fn users_table(users: &[WebUiUser]) -> String {
    let rows: Vec<UserRow> = users
        .iter()
        .enumerate()
        .map(|(i, user)| UserRow {
            index: i + 1,
            name: user.name.clone(),
            email: user.email.clone(),
            id: user.id.clone(),
        })
        .collect();

    Table::new(rows)
        .with(TableStyle::ascii_rounded())
        .to_string()
}

/// Whether a script fragment holds anything besides comments
fn has_statement(fragment: &str) -> bool {
    fragment
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with("--"))
}

/// Split a script on `;` outside quoted text and `--` comments
///
/// Fragments holding only comments or whitespace are dropped.
pub fn split_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '-' if matches!(chars.peek(), Some((_, '-'))) => in_comment = true,
                ';' => {
                    statements.push(sql[start..idx].trim());
                    start = idx + 1;
                }
                _ => {}
            },
        }
    }
    statements.push(sql[start..].trim());

    statements
        .into_iter()
        .filter(|fragment| has_statement(fragment))
        .collect()
}

fn preview(statement: &str) -> String {
    statement.chars().take(100).collect()
}

/// Local copy of the Open WebUI database
pub struct WebUiDatabase {
    conn: Connection,
    path: Option<PathBuf>,
}

impl WebUiDatabase {
    /// Open an existing database file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MigratorError::FileOperation(format!(
                "Database file not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)
            .map_err(|e| MigratorError::Database(format!("Failed to open database: {}", e)))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Copy the database file to `backup`
    pub fn create_backup(&self, backup: &Path) -> Result<()> {
        let source = self.path.as_deref().ok_or_else(|| {
            MigratorError::FileOperation("Cannot back up an in-memory database".to_string())
        })?;
        fs::copy(source, backup).map_err(|e| {
            MigratorError::FileOperation(format!(
                "Failed to back up {} to {}: {}",
                source.display(),
                backup.display(),
                e
            ))
        })?;
        log::info!("Backed up database to {}", backup.display());
        Ok(())
    }

    /// All users, oldest first
    pub fn users(&self) -> Result<Vec<WebUiUser>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM user ORDER BY created_at")
            .map_err(|e| MigratorError::Database(format!("Failed to get users: {}", e)))?;
        let users = stmt
            .query_map([], |row| {
                Ok(WebUiUser {
                    id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    email: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn user_by_id(&self, user_id: &str) -> Result<Option<WebUiUser>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email FROM user WHERE id = ?1",
                [user_id],
                |row| {
                    Ok(WebUiUser {
                        id: row.get(0)?,
                        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        email: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Check that every required table exists
    pub fn validate_schema(&self) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let existing = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let missing: Vec<&str> = REQUIRED_TABLES
            .iter()
            .copied()
            .filter(|table| !existing.iter().any(|name| name == table))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MigratorError::Validation(format!(
                "Missing required tables: {}",
                missing.join(", ")
            )))
        }
    }

    /// Apply a SQL file
    pub fn execute_sql_file(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(MigratorError::FileOperation(format!(
                "SQL file not found: {}",
                path.display()
            )));
        }
        let sql = fs::read_to_string(path)?;
        let executed = self.execute_script(&sql)?;
        log::info!(
            "Executed {} SQL statements from {}",
            executed,
            path.display()
        );
        Ok(executed)
    }
}

impl SqlSink for WebUiDatabase {
    fn execute_script(&mut self, sql: &str) -> Result<usize> {
        let statements = split_statements(sql);
        let total = statements.len();

        let mut tx = self.conn.transaction()?;
        for (idx, statement) in statements.iter().enumerate() {
            if let Err(e) = tx.execute_batch(&format!("{};", statement)) {
                return Err(MigratorError::Database(format!(
                    "Error executing statement {}: {} (statement preview: {}...)",
                    idx + 1,
                    e,
                    preview(statement)
                )));
            }

            let executed = idx + 1;
            if executed % COMMIT_EVERY == 0 {
                tx.commit()?;
                log::info!("Executed {}/{} statements...", executed, total);
                tx = self.conn.transaction()?;
            }
        }
        tx.commit()?;

        Ok(total)
    }
}

// =============================================================================
// User selection
// =============================================================================

/// Resolves the account that will own migrated data
pub struct UserSelector<'a> {
    db: &'a WebUiDatabase,
}

impl<'a> UserSelector<'a> {
    pub fn new(db: &'a WebUiDatabase) -> Self {
        Self { db }
    }

    /// Resolve interactively on the terminal
    pub fn resolve(&self, configured: Option<&str>) -> Result<String> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.resolve_with(configured, &mut input, &mut io::stdout())
    }

    /// Resolve the owning user
    ///
    /// A configured id must exist. Otherwise a single user is picked
    /// automatically and multiple users are offered as a numbered list.
    pub fn resolve_with<R: BufRead, W: Write>(
        &self,
        configured: Option<&str>,
        input: &mut R,
        output: &mut W,
    ) -> Result<String> {
        if let Some(user_id) = configured.map(str::trim).filter(|id| !id.is_empty()) {
            let user = self.db.user_by_id(user_id)?.ok_or_else(|| {
                MigratorError::UserNotFound(format!(
                    "USER_ID '{}' from environment not found in database",
                    user_id
                ))
            })?;
            log::info!("Using user {} ({}) - ID: {}", user.name, user.email, user.id);
            return Ok(user.id);
        }

        let users = self.db.users()?;
        match users.len() {
            0 => Err(MigratorError::UserNotFound(
                "No users found in database and no USER_ID provided in environment".to_string(),
            )),
            1 => {
                let user = &users[0];
                log::info!("Found single user: {} ({}) - ID: {}", user.name, user.email, user.id);
                Ok(user.id.clone())
            }
            _ => Self::prompt(&users, input, output),
        }
    }

    fn prompt<R: BufRead, W: Write>(
        users: &[WebUiUser],
        input: &mut R,
        output: &mut W,
    ) -> Result<String> {
        writeln!(output, "\nMultiple users found:")?;
        writeln!(output, "{}", users_table(users))?;

        loop {
            write!(
                output,
                "\nSelect user number for migration (or press Enter for first user): "
            )?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(MigratorError::UserSelection(
                    "Input closed before a user was selected".to_string(),
                ));
            }

            let choice = line.trim();
            if choice.is_empty() {
                return Ok(users[0].id.clone());
            }

            match choice.parse::<usize>() {
                Ok(n) if (1..=users.len()).contains(&n) => return Ok(users[n - 1].id.clone()),
                Ok(_) => writeln!(
                    output,
                    "Invalid choice. Please enter a number between 1 and {}",
                    users.len()
                )?,
                Err(_) => writeln!(output, "Invalid input. Please enter a number.")?,
            }
        }
    }
}
