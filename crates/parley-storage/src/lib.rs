//! Parley storage: the statement store contract and its backends.
//!
//! Provides an in-memory reference store and a WAL-mode SQLite store with
//! migrations. Both serialize count updates so concurrent conversations
//! never lose an increment.

pub mod db;
pub mod memory;
pub mod migrations;
pub mod sqlite;
pub mod store;

pub use db::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::StatementStore;
