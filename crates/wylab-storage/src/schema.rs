//! Opening the session database.
//!
//! The schema lives in `migrations/` and is embedded with `include_str!`;
//! `rusqlite_migration` tracks the applied step in `user_version`.

use std::time::Duration;

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::error::StorageError;

/// Path understood by SQLite as a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// How long a write waits on another process holding the file lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial_schema.sql"))])
}

/// Where the session database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(String),
    Memory,
}

impl Location {
    /// Maps [`MEMORY_PATH`] to [`Location::Memory`], anything else to a file.
    pub fn from_path(path: &str) -> Self {
        if path == MEMORY_PATH {
            Location::Memory
        } else {
            Location::File(path.to_string())
        }
    }

    /// Opens the database and brings its schema up to date.
    pub fn open(&self) -> Result<Connection, StorageError> {
        let mut conn = match self {
            Location::File(path) => {
                let conn = Connection::open(path)?;
                // Several `wylab` invocations may share one file.
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn
            }
            Location::Memory => Connection::open_in_memory()?,
        };

        migrations()
            .to_latest(&mut conn)
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        let version = schema_version(&conn)?;
        tracing::debug!(location = ?self, version, "session database ready");
        Ok(conn)
    }
}

/// The migration step recorded in the database.
pub fn schema_version(conn: &Connection) -> Result<i64, StorageError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
