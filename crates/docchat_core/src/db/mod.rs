use std::collections::HashSet;
use std::path::Path;

use rusqlite::Connection;

use crate::error::AppError;

// Applied in order; names are the idempotency key, so never rename an entry.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_init.sql",
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../migrations/0001_init.sql"
    )),
)];

pub fn open(path: &Path) -> Result<Connection, AppError> {
    Connection::open(path).map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to open SQLite database")
            .with_details(e.to_string())
    })
}

pub fn open_in_memory() -> Result<Connection, AppError> {
    Connection::open_in_memory().map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to open in-memory SQLite database")
            .with_details(e.to_string())
    })
}

pub fn migrate(conn: &mut Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;\n\
         CREATE TABLE IF NOT EXISTS _migrations (\n\
           name TEXT PRIMARY KEY NOT NULL,\n\
           applied_at TEXT NOT NULL\n\
         );",
    )
    .map_err(|e| {
        AppError::new(
            "DB_MIGRATIONS_TABLE_FAILED",
            "Failed to ensure migrations table exists",
        )
        .with_details(e.to_string())
    })?;

    let applied = applied_names(conn)?;
    for (name, sql) in MIGRATIONS {
        if !applied.contains(*name) {
            apply_migration(conn, name, sql)?;
        }
    }
    Ok(())
}

fn applied_names(conn: &Connection) -> Result<HashSet<String>, AppError> {
    let mut stmt = conn.prepare("SELECT name FROM _migrations").map_err(|e| {
        AppError::new(
            "DB_MIGRATIONS_QUERY_FAILED",
            "Failed to query applied migrations",
        )
        .with_details(e.to_string())
    })?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| {
            AppError::new(
                "DB_MIGRATIONS_QUERY_FAILED",
                "Failed to read applied migrations",
            )
            .with_details(e.to_string())
        })?;
    rows.collect::<Result<HashSet<String>, _>>().map_err(|e| {
        AppError::new(
            "DB_MIGRATIONS_QUERY_FAILED",
            "Failed to read applied migration row",
        )
        .with_details(e.to_string())
    })
}

fn apply_migration(conn: &mut Connection, name: &str, sql: &str) -> Result<(), AppError> {
    let tx = conn.transaction().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to start migration transaction")
            .with_details(e.to_string())
    })?;

    tx.execute_batch(sql).map_err(|e| {
        AppError::new("DB_MIGRATION_FAILED", format!("Migration {name} failed"))
            .with_details(e.to_string())
    })?;

    // The timestamp is operational metadata only; let SQLite stamp it.
    tx.execute(
        "INSERT INTO _migrations(name, applied_at) \
         VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
        [name],
    )
    .map_err(|e| {
        AppError::new(
            "DB_MIGRATION_FAILED",
            format!("Failed to record migration {name}"),
        )
        .with_details(e.to_string())
    })?;

    tx.commit().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to commit migration transaction")
            .with_details(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OptionalExtension;

    #[test]
    fn migrations_create_expected_tables() {
        let mut conn = open_in_memory().expect("open");
        migrate(&mut conn).expect("migrate");

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='documents'")
            .unwrap();
        let name: Option<String> = stmt.query_row([], |row| row.get(0)).optional().unwrap();
        assert_eq!(name.as_deref(), Some("documents"));
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut conn = open_in_memory().expect("open");
        migrate(&mut conn).expect("migrate once");
        migrate(&mut conn).expect("migrate twice");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
