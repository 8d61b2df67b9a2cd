use crate::error::{StoreError, StoreResult};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "conductbook.sqlite3";

/// Layout version written to `meta.schema_version`. Bump when a table changes
/// shape and add the upgrade step to `init_schema`.
pub const SCHEMA_VERSION: i64 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace directory {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    init_schema(&conn).expect("init schema");
    conn
}

pub fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    // Refuse to touch tables laid out by a newer binary.
    match stored_schema_version(conn)? {
        Some(v) if v > SCHEMA_VERSION => {
            return Err(StoreError::corrupt(format!(
                "schema version {v} is newer than supported version {SCHEMA_VERSION}"
            )));
        }
        Some(_) => {}
        None => {
            conn.execute(
                "INSERT OR IGNORE INTO meta(key, value) VALUES('schema_version', ?)",
                [SCHEMA_VERSION.to_string()],
            )?;
        }
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL COLLATE NOCASE,
            role TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_email ON accounts(email)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS discipline_records(
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            uucms_no TEXT NOT NULL,
            issue_type TEXT NOT NULL,
            reason TEXT NOT NULL,
            created_at TEXT NOT NULL,
            reported_by TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_discipline_records_uucms ON discipline_records(uucms_no)",
        [],
    )?;

    Ok(())
}

pub fn stored_schema_version(conn: &Connection) -> StoreResult<Option<i64>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StoreError::corrupt(format!("unreadable schema version {s:?}"))),
    }
}

pub fn settings_get_json(conn: &Connection, key: &str) -> StoreResult<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::corrupt(format!("setting {key}: {e}")))
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, value.to_string()),
    )?;
    Ok(())
}

pub fn settings_delete(conn: &Connection, key: &str) -> StoreResult<()> {
    conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_database_is_stamped_with_current_version() {
        let conn = open_in_memory();
        assert_eq!(stored_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn init_is_idempotent() {
        let conn = open_in_memory();
        init_schema(&conn).expect("second init");
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM meta", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let conn = open_in_memory();
        conn.execute(
            "UPDATE meta SET value = ? WHERE key = 'schema_version'",
            [(SCHEMA_VERSION + 1).to_string()],
        )
        .unwrap();
        let e = init_schema(&conn).unwrap_err();
        assert_eq!(e.code(), "storage_corrupt");
    }

    #[test]
    fn settings_upsert_and_delete() {
        let conn = open_in_memory();
        assert_eq!(settings_get_json(&conn, "k").unwrap(), None);
        settings_set_json(&conn, "k", &json!({ "a": 1 })).unwrap();
        settings_set_json(&conn, "k", &json!({ "a": 2 })).unwrap();
        assert_eq!(settings_get_json(&conn, "k").unwrap(), Some(json!({ "a": 2 })));
        settings_delete(&conn, "k").unwrap();
        assert_eq!(settings_get_json(&conn, "k").unwrap(), None);
    }

    #[test]
    fn unparseable_setting_is_corruption_not_absence() {
        let conn = open_in_memory();
        conn.execute(
            "INSERT INTO settings(key, value_json) VALUES('k', '{not json')",
            [],
        )
        .unwrap();
        let e = settings_get_json(&conn, "k").unwrap_err();
        assert_eq!(e.code(), "storage_corrupt");
    }
}
