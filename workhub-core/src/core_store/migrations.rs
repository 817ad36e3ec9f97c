//! Versioned schema migrations
//!
//! Each migration is applied atomically and recorded in the schema_version
//! table, so running them repeatedly is safe.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};

use super::errors::StoreError;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial users, workspaces, and channels schema",
        up_sql: r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );

            -- Registered users
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,                 -- bcrypt hash
                avatar TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Workspaces
            CREATE TABLE IF NOT EXISTS workspaces (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                join_code TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (name, description)
            );

            -- Workspace members (join table with roles, insert order preserved)
            CREATE TABLE IF NOT EXISTS workspace_members (
                workspace_id TEXT NOT NULL,
                member_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('admin', 'member')),
                PRIMARY KEY (workspace_id, member_id),
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_workspace_members_member
                ON workspace_members(member_id);

            -- Channel entities
            CREATE TABLE IF NOT EXISTS channels (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_channels_workspace ON channels(workspace_id);

            -- A workspace's ordered channel references. No foreign key to
            -- channels: a reference dangles if a channel is deleted out from
            -- under its workspace.
            CREATE TABLE IF NOT EXISTS workspace_channels (
                workspace_id TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                PRIMARY KEY (workspace_id, channel_id),
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );
        "#,
    }]
}

/// Get current schema version from the database
fn get_current_version(pool: &Pool<SqliteConnectionManager>) -> Result<i32, StoreError> {
    let conn = pool.get()?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Result<i32, _> = conn.query_row(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    );

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), StoreError> {
    let current_version = get_current_version(pool)?;
    let pending: Vec<_> = get_migrations()
        .into_iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    let conn = pool.get()?;

    for migration in pending {
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.up_sql)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, now],
        )?;

        tx.commit()?;

        tracing::debug!(
            version = migration.version,
            "applied migration: {}",
            migration.description
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_store::memory_pool;

    #[test]
    fn test_initial_migration_creates_tables() {
        let pool = memory_pool().unwrap();
        migrate(&pool).expect("migration failed");

        let conn = pool.get().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"workspaces".to_string()));
        assert!(tables.contains(&"workspace_members".to_string()));
        assert!(tables.contains(&"channels".to_string()));
        assert!(tables.contains(&"workspace_channels".to_string()));
    }

    #[test]
    fn test_migration_version_tracking() {
        let pool = memory_pool().unwrap();
        migrate(&pool).expect("migration failed");

        let version = get_current_version(&pool).expect("failed to read version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_idempotent_migrations() {
        let pool = memory_pool().unwrap();

        migrate(&pool).expect("first run failed");
        migrate(&pool).expect("second run failed");

        let version = get_current_version(&pool).expect("failed to read version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }
}
