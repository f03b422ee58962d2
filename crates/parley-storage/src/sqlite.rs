//! SQLite-backed statement store.
//!
//! Statements live in `statements`, pairings in `response_links`. Every
//! write runs inside a transaction on the single guarded connection.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use parley_core::error::{ParleyError, Result};
use parley_core::types::{CandidateScope, ResponseLink, Statement};

use crate::db::Database;
use crate::store::StatementStore;

/// Persistent store over a [`Database`].
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open (or create) a writable store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::new(path)?)))
    }

    /// Open an existing corpus for reading only.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::open_read_only(path)?)))
    }

    /// A fresh in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(Database::in_memory()?)))
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.db.is_read_only() {
            return Err(ParleyError::Storage(
                "database is opened read-only".to_string(),
            ));
        }
        Ok(())
    }
}

fn storage_err(e: rusqlite::Error) -> ParleyError {
    ParleyError::Storage(e.to_string())
}

fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

/// Insert `text` if missing and bump its counter by `increment`.
fn touch_statement(conn: &Connection, text: &str, increment: i64, now: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO statements (text, occurrence_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT (text) DO UPDATE SET
             occurrence_count = occurrence_count + excluded.occurrence_count,
             updated_at = excluded.updated_at",
        rusqlite::params![text, increment, now],
    )
    .map_err(storage_err)?;
    Ok(())
}

fn bump_link(conn: &Connection, prior: &str, next: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO response_links (next_text, prior_text, occurrence_count)
         VALUES (?1, ?2, 1)
         ON CONFLICT (next_text, prior_text) DO UPDATE SET
             occurrence_count = occurrence_count + 1",
        rusqlite::params![next, prior],
    )
    .map_err(storage_err)?;
    Ok(())
}

fn load_links(conn: &Connection, next: Option<&str>) -> Result<HashMap<String, Vec<ResponseLink>>> {
    let mut stmt = conn
        .prepare(
            "SELECT next_text, prior_text, occurrence_count
             FROM response_links
             WHERE ?1 IS NULL OR next_text = ?1
             ORDER BY rowid",
        )
        .map_err(storage_err)?;

    let rows = stmt
        .query_map(rusqlite::params![next], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ResponseLink {
                    text: row.get(1)?,
                    occurrence_count: row.get::<_, i64>(2)? as u64,
                },
            ))
        })
        .map_err(storage_err)?;

    let mut links: HashMap<String, Vec<ResponseLink>> = HashMap::new();
    for row in rows {
        let (next_text, link) = row.map_err(storage_err)?;
        links.entry(next_text).or_default().push(link);
    }
    Ok(links)
}

fn row_to_statement(row: &rusqlite::Row<'_>) -> rusqlite::Result<Statement> {
    Ok(Statement {
        text: row.get(0)?,
        occurrence_count: row.get::<_, i64>(1)? as u64,
        in_response_to: Vec::new(),
        created_at: from_micros(row.get(2)?),
        updated_at: from_micros(row.get(3)?),
    })
}

fn find_statement(conn: &Connection, text: &str) -> Result<Option<Statement>> {
    let found = conn
        .query_row(
            "SELECT text, occurrence_count, created_at, updated_at
             FROM statements WHERE text = ?1",
            rusqlite::params![text],
            row_to_statement,
        )
        .optional()
        .map_err(storage_err)?;

    match found {
        Some(mut statement) => {
            let mut links = load_links(conn, Some(text))?;
            statement.in_response_to = links.remove(text).unwrap_or_default();
            Ok(Some(statement))
        }
        None => Ok(None),
    }
}

impl StatementStore for SqliteStore {
    fn get_candidates(&self, scope: &CandidateScope) -> Result<Vec<Statement>> {
        self.db.with_conn(|conn| {
            let (sql, limit) = match scope {
                CandidateScope::All => (
                    "SELECT text, occurrence_count, created_at, updated_at
                     FROM statements ORDER BY rowid",
                    None,
                ),
                CandidateScope::Responses => (
                    "SELECT text, occurrence_count, created_at, updated_at
                     FROM statements
                     WHERE EXISTS (SELECT 1 FROM response_links l WHERE l.next_text = statements.text)
                     ORDER BY rowid",
                    None,
                ),
                CandidateScope::Recent { limit } => (
                    "SELECT text, occurrence_count, created_at, updated_at FROM (
                         SELECT rowid AS seq, text, occurrence_count, created_at, updated_at
                         FROM statements
                         ORDER BY updated_at DESC, rowid ASC
                         LIMIT ?1
                     ) ORDER BY seq",
                    Some(*limit as i64),
                ),
            };

            let mut stmt = conn.prepare(sql).map_err(storage_err)?;
            let rows = match limit {
                Some(limit) => stmt.query_map(rusqlite::params![limit], row_to_statement),
                None => stmt.query_map([], row_to_statement),
            }
            .map_err(storage_err)?;

            let mut pool = Vec::new();
            for row in rows {
                pool.push(row.map_err(storage_err)?);
            }

            let mut links = load_links(conn, None)?;
            for statement in &mut pool {
                statement.in_response_to = links.remove(&statement.text).unwrap_or_default();
            }
            debug!(scope = ?scope, size = pool.len(), "Candidate pool loaded");
            Ok(pool)
        })
    }

    fn upsert(&self, statement: &Statement) -> Result<Statement> {
        self.ensure_writable()?;
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            touch_statement(&tx, &statement.text, 1, Utc::now().timestamp_micros())?;
            let stored = find_statement(&tx, &statement.text)?;
            tx.commit().map_err(storage_err)?;
            stored.ok_or_else(|| {
                ParleyError::Storage(format!("statement vanished after upsert: {}", statement.text))
            })
        })
    }

    fn link_response(&self, prior: &str, next: &str) -> Result<()> {
        self.ensure_writable()?;
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            touch_statement(&tx, next, 0, Utc::now().timestamp_micros())?;
            bump_link(&tx, prior, next)?;
            tx.commit().map_err(storage_err)
        })
    }

    fn learn(&self, next: &Statement, prior: Option<&str>) -> Result<Statement> {
        self.ensure_writable()?;
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            touch_statement(&tx, &next.text, 1, Utc::now().timestamp_micros())?;
            if let Some(prior) = prior {
                bump_link(&tx, prior, &next.text)?;
            }
            let stored = find_statement(&tx, &next.text)?;
            tx.commit().map_err(storage_err)?;
            stored.ok_or_else(|| {
                ParleyError::Storage(format!("statement vanished after learn: {}", next.text))
            })
        })
    }

    fn learn_exchange(
        &self,
        input: &Statement,
        prior: Option<&str>,
        response: &Statement,
    ) -> Result<Statement> {
        self.ensure_writable()?;
        self.db.with_conn(|conn| {
            let now = Utc::now().timestamp_micros();
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            touch_statement(&tx, &input.text, 1, now)?;
            if let Some(prior) = prior {
                bump_link(&tx, prior, &input.text)?;
            }
            touch_statement(&tx, &response.text, 1, now)?;
            let stored = find_statement(&tx, &input.text)?;
            tx.commit().map_err(storage_err)?;
            stored.ok_or_else(|| {
                ParleyError::Storage(format!("statement vanished after learn: {}", input.text))
            })
        })
    }

    fn find(&self, text: &str) -> Result<Option<Statement>> {
        self.db.with_conn(|conn| find_statement(conn, text))
    }

    fn count(&self) -> Result<u64> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM statements", [], |row| row.get(0))
                .map_err(storage_err)?;
            Ok(count as u64)
        })
    }

    fn drop_all(&self) -> Result<()> {
        self.ensure_writable()?;
        self.db.with_conn(|conn| {
            conn.execute_batch(
                "DELETE FROM response_links;
                 DELETE FROM statements;",
            )
            .map_err(storage_err)?;
            info!("SQLite corpus dropped");
            Ok(())
        })
    }

    fn is_writable(&self) -> bool {
        !self.db.is_read_only()
    }
}
