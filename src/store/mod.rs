// Store layer: durable key-value storage for history, counters and settings.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever THREATDESK_DB_PATH points.

pub mod memory;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::KeyValueStore;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database and run migrations.
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open the SQLite-backed store at `db_path`, creating it on first use.
pub fn open_sqlite(db_path: &str) -> Result<SqliteStore> {
    let conn = initialize(db_path)?;
    Ok(SqliteStore::new(conn))
}
