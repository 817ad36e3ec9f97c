//! Persistence layer
//!
//! SQL-backed repositories over a shared r2d2 connection pool, with
//! versioned migrations.

pub mod errors;
pub mod migrations;
pub mod repository;
pub mod sql_store;

pub use errors::StoreError;
pub use migrations::{migrate, CURRENT_SCHEMA_VERSION};
pub use repository::{ChannelStore, Repository, UserStore, WorkspaceStore};
pub use sql_store::{SqlChannelStore, SqlUserStore, SqlWorkspaceStore};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

/// Open a pool over a database file
pub fn file_pool(path: impl AsRef<Path>) -> Result<Pool<SqliteConnectionManager>, StoreError> {
    let manager = SqliteConnectionManager::file(path.as_ref());
    Pool::new(manager).map_err(StoreError::from)
}

/// Open a pool over a private in-memory database
///
/// Every pooled connection must see the same data, so this uses a uniquely
/// named shared-cache database rather than one anonymous `:memory:` handle
/// per connection. Intended for tests and ephemeral setups.
pub fn memory_pool() -> Result<Pool<SqliteConnectionManager>, StoreError> {
    let name = format!(
        "file:workhub-mem-{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().simple()
    );
    let manager = SqliteConnectionManager::file(name);
    Pool::new(manager).map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pools_are_isolated() {
        let first = memory_pool().unwrap();
        let second = memory_pool().unwrap();

        first
            .get()
            .unwrap()
            .execute_batch("CREATE TABLE marker (id INTEGER)")
            .unwrap();

        // The second pool must not see the first pool's table
        let count: Result<i64, _> = second.get().unwrap().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'marker'",
            [],
            |row| row.get(0),
        );
        assert_eq!(count.unwrap(), 0);
    }

    #[test]
    fn test_memory_pool_shares_data_across_connections() {
        let pool = memory_pool().unwrap();

        let a = pool.get().unwrap();
        a.execute_batch("CREATE TABLE marker (id INTEGER); INSERT INTO marker VALUES (1);")
            .unwrap();

        let b = pool.get().unwrap();
        let count: i64 = b
            .query_row("SELECT COUNT(*) FROM marker", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_file_pool_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let pool = file_pool(dir.path().join("workhub.db")).unwrap();
        migrate(&pool).unwrap();

        let version: i32 = pool
            .get()
            .unwrap()
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }
}
