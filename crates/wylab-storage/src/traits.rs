//! The [`KeyValueStore`] trait: the host's persistent storage capability.
//!
//! Values are plain strings. Backends report failures as [`StorageError`];
//! callers that only need best-effort semantics (see
//! [`SessionStore`](crate::session::SessionStore)) downgrade those errors to
//! "absent" or "not saved".
//!
//! The trait is synchronous, matching the single-threaded controller that
//! owns it.

use crate::error::StorageError;

/// A string key/value store.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}
