//! Tests for the `migrator` command line
//!
//! Runs the binary in a temp working directory so `.env` lookups and
//! default output paths stay isolated.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn migrator(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("migrator").unwrap();
    cmd.current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("USER_ID")
        .env_remove("RUST_LOG")
        .env_remove("MIGRATOR_DATA_DIR")
        .env_remove("MIGRATOR_OUTPUT_DIR");
    cmd
}

// ============================================================================
// Inspection Commands
// ============================================================================

mod inspection_tests {
    use super::*;

    #[test]
    fn test_providers_lists_chatgpt() {
        let dir = TempDir::new().unwrap();
        migrator(dir.path())
            .arg("providers")
            .assert()
            .success()
            .stdout(predicate::str::contains("chatgpt"))
            .stdout(predicate::str::contains("conversations.json"))
            .stdout(predicate::str::contains("memory.txt"));
    }

    #[test]
    fn test_users_without_database_fails() {
        let dir = TempDir::new().unwrap();
        migrator(dir.path())
            .args(["users", "--db", "missing.db"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Database file not found"));
    }

    #[test]
    fn test_unknown_command_is_usage_error() {
        let dir = TempDir::new().unwrap();
        migrator(dir.path()).arg("frobnicate").assert().code(2);
    }
}

// ============================================================================
// Generator Commands
// ============================================================================

mod generator_tests {
    use super::*;

    #[test]
    fn test_memory_prints_merge_sql() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("notes.txt"),
            "Prefers tea over coffee\n\nok\n\nLives in a small coastal town",
        )
        .unwrap();

        migrator(dir.path())
            .args(["memory", "notes.txt", "--user-id", "u1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("-- Memory 2"))
            .stdout(predicate::str::contains("WHERE NOT EXISTS"))
            .stdout(predicate::str::contains("-- Memory 3").not());
    }

    #[test]
    fn test_memory_replace_to_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "Prefers tea over coffee").unwrap();

        migrator(dir.path())
            .args(["memory", "notes.txt", "--replace", "--output", "memory.sql"])
            .assert()
            .success();

        let sql = fs::read_to_string(dir.path().join("memory.sql")).unwrap();
        assert!(sql.contains("DELETE FROM memory WHERE user_id = 'user';"));
    }

    #[test]
    fn test_memory_without_entries_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "hi\n\nyo").unwrap();

        migrator(dir.path())
            .args(["memory", "notes.txt"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Nothing to migrate"));
    }

    #[test]
    fn test_sql_from_folder() {
        let dir = TempDir::new().unwrap();
        let records = dir.path().join("records");
        fs::create_dir_all(&records).unwrap();
        fs::write(
            records.join("chat.json"),
            json!({"id": "c1", "title": "Hello", "userId": "u1", "timestamp": 1700000000})
                .to_string(),
        )
        .unwrap();

        migrator(dir.path())
            .args(["sql", "records", "--tags", "chatgpt, Work", "--output", "out.sql"])
            .assert()
            .success();

        let sql = fs::read_to_string(dir.path().join("out.sql")).unwrap();
        assert!(sql.contains("'work','Work','u1'"));
        assert!(sql.contains("WHERE \"id\" = 'c1'"));
    }
}

// ============================================================================
// Conversion Command
// ============================================================================

mod convert_tests {
    use super::*;

    #[test]
    fn test_convert_writes_json_and_sql() {
        let dir = TempDir::new().unwrap();
        let export = dir.path().join("export");
        fs::create_dir_all(&export).unwrap();
        fs::write(
            export.join("conversations.json"),
            json!([{
                "title": "Recipe ideas",
                "id": "conv-1",
                "chat_messages": [{"text": "Dinner?"}, {"text": "Risotto."}]
            }])
            .to_string(),
        )
        .unwrap();
        fs::write(export.join("memory.txt"), "Vegetarian since 2019").unwrap();

        migrator(dir.path())
            .args([
                "convert", "--user-id", "u1", "--data", "export", "--out", "converted",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Converted 1 conversations"))
            .stdout(predicate::str::contains("Converted 1 memory entries"));

        assert!(dir
            .path()
            .join("converted")
            .join("Recipe_ideas_conv-1.json")
            .exists());
        let sql = fs::read_to_string(dir.path().join("conversations.sql")).unwrap();
        assert!(sql.contains("'imported-chatgpt'"));
        assert!(fs::read_to_string(dir.path().join("memory.sql"))
            .unwrap()
            .contains("Vegetarian since 2019"));
    }

    #[test]
    fn test_convert_without_data_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        migrator(dir.path())
            .args(["convert", "--user-id", "u1", "--data", "empty"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("No data files found"));
    }

    #[test]
    fn test_convert_unknown_provider_fails() {
        let dir = TempDir::new().unwrap();
        migrator(dir.path())
            .args(["convert", "--provider", "grok", "--user-id", "u1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Unsupported provider"));
    }
}
