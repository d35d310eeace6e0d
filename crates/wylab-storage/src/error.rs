//! Storage error types for wylab-storage.

use thiserror::Error;

/// Errors produced by key/value backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite rejected a statement or could not open the database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A schema migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
