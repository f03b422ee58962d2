//! Database schema migrations.
//!
//! Applies the corpus schema: statements, response_links, and the
//! schema_migrations bookkeeping table.

use rusqlite::Connection;
use tracing::info;

use parley_core::error::ParleyError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), ParleyError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ParleyError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ParleyError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: corpus_schema");
    }

    Ok(())
}

/// Version 1: statements and their response links.
///
/// Timestamps are microseconds since the Unix epoch.
fn apply_v1(conn: &Connection) -> Result<(), ParleyError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS statements (
            text              TEXT PRIMARY KEY NOT NULL,
            occurrence_count  INTEGER NOT NULL DEFAULT 0
                              CHECK (occurrence_count >= 0),
            created_at        INTEGER NOT NULL,
            updated_at        INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_statements_updated_at
            ON statements (updated_at DESC);

        -- One row per (prior -> next) pairing.
        CREATE TABLE IF NOT EXISTS response_links (
            next_text         TEXT NOT NULL
                              REFERENCES statements (text) ON DELETE CASCADE,
            prior_text        TEXT NOT NULL,
            occurrence_count  INTEGER NOT NULL DEFAULT 1
                              CHECK (occurrence_count >= 1),
            PRIMARY KEY (next_text, prior_text)
        );

        CREATE INDEX IF NOT EXISTS idx_response_links_prior
            ON response_links (prior_text);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'corpus_schema');
        ",
    )
    .map_err(|e| ParleyError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(conn: &Connection) -> i64 {
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_migrations_apply_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(version(&conn), 1);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_link_count_must_be_positive() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO statements (text, occurrence_count, created_at, updated_at)
             VALUES ('Fine', 0, 0, 0)",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO response_links (next_text, prior_text, occurrence_count)
             VALUES ('Fine', 'How are you?', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
