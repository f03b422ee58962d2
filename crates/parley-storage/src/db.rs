//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode and recommended PRAGMAs on initialization.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use parley_core::error::ParleyError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
///
/// The connection is behind a Mutex since rusqlite Connection is not Sync.
/// Holding the lock for a whole closure is what makes count updates atomic.
pub struct Database {
    conn: Mutex<Connection>,
    read_only: bool,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, and runs
    /// all pending migrations.
    pub fn new(path: &Path) -> Result<Self, ParleyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ParleyError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| ParleyError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
            read_only: false,
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Open an existing database without write access.
    ///
    /// Migrations are not run; the schema must already exist.
    pub fn open_read_only(path: &Path) -> Result<Self, ParleyError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ParleyError::Storage(format!("Failed to open database: {}", e)))?;

        info!("Database opened read-only at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            read_only: true,
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ParleyError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ParleyError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| ParleyError::Storage(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
            read_only: false,
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ParleyError>
    where
        F: FnOnce(&Connection) -> Result<T, ParleyError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ParleyError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("read_only", &self.read_only)
            .finish()
    }
}
