//! Persistence for the compile session.
//!
//! Provides the [`KeyValueStore`] capability trait (a best-effort string
//! key/value store, the host's persistent storage) with two first-class
//! backends, plus the [`SessionStore`] that saves and restores the last
//! submitted document on top of it.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`traits`]: KeyValueStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: database location, pragmas and migrations
//! - [`sqlite`]: SqliteStore implementation
//! - [`session`]: SessionState and the best-effort SessionStore

pub mod error;
pub mod memory;
pub mod schema;
pub mod session;
pub mod sqlite;
pub mod traits;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use session::{SessionState, SessionStore, SESSION_KEY};
pub use sqlite::SqliteStore;
pub use traits::KeyValueStore;
