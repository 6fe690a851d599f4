//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode on initialization and implements `KeyValueStore`
//! over the `kv_store` table.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use fany_core::error::FanyError;

use crate::migrations;
use crate::store::KeyValueStore;

/// Thread-safe SQLite database wrapper.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode and synchronous=NORMAL, then runs all pending
    /// migrations.
    pub fn new(path: &Path) -> Result<Self, FanyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| FanyError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| FanyError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, FanyError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FanyError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, FanyError>
    where
        F: FnOnce(&Connection) -> Result<T, FanyError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FanyError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, FanyError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| FanyError::Storage(format!("Failed to read {}: {}", key, e)))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FanyError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, strftime('%s', 'now'))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value],
            )
            .map_err(|e| FanyError::Storage(format!("Failed to write {}: {}", key, e)))?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), FanyError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .map_err(|e| FanyError::Storage(format!("Failed to delete {}: {}", key, e)))?;
            Ok(())
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
