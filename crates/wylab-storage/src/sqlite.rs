//! SQLite implementation of [`KeyValueStore`].
//!
//! [`SqliteStore`] keeps one row per key in `kv_entries`, upserting on write.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::schema::Location;
use crate::traits::KeyValueStore;

/// SQLite-backed implementation of [`KeyValueStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`; `:memory:` keeps it
    /// in memory.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = Location::from_path(path).open()?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Location::Memory.open()?;
        Ok(SqliteStore { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, value],
        )?;
        Ok(())
    }
}
