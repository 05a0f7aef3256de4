// Key-value queries against the `kv_store` table.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Get a value by key.
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a value (upsert).
pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Write several values in one transaction so readers never see half of
/// a related pair.
pub fn set_values(conn: &mut Connection, pairs: &[(&str, &str)]) -> Result<()> {
    let tx = conn.transaction()?;
    for (key, value) in pairs {
        set_value(&tx, key, value)?;
    }
    tx.commit()?;
    Ok(())
}
