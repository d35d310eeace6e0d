//! Best-effort persistence of the last submitted document.
//!
//! [`SessionStore`] writes a [`SessionState`] as one JSON document under
//! [`SESSION_KEY`] on every submission and reads it once at startup. It never
//! fails: a missing backend, a backend error, or an unreadable document all
//! degrade to "not saved" / "absent" with a `warn!`, leaving the caller to
//! apply its own default.

use serde::{Deserialize, Serialize};

use crate::traits::KeyValueStore;

/// Key under which the session document is stored.
pub const SESSION_KEY: &str = "whileylabs";

/// The persisted part of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Source text at the last submission.
    pub code: String,
    /// Whether verification was enabled at the last submission.
    pub verify: bool,
}

/// Saves and restores [`SessionState`] over an optional backend.
#[derive(Debug)]
pub struct SessionStore<S> {
    backend: Option<S>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        SessionStore {
            backend: Some(backend),
        }
    }

    /// A store for a host with no persistent storage; every call is a no-op.
    pub fn unavailable() -> Self {
        SessionStore { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend(&self) -> Option<&S> {
        self.backend.as_ref()
    }

    /// Persists `state`. Failures are logged, never returned.
    pub fn save(&mut self, state: &SessionState) {
        let Some(backend) = self.backend.as_mut() else {
            tracing::debug!("no persistent storage, session not saved");
            return;
        };

        let document = match serde_json::to_string(state) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode session state");
                return;
            }
        };

        if let Err(err) = backend.set(SESSION_KEY, &document) {
            tracing::warn!(error = %err, "failed to save session state");
        }
    }

    /// Reads the last saved state, or `None` if there is none to read.
    pub fn load(&self) -> Option<SessionState> {
        let backend = self.backend.as_ref()?;

        let document = match backend.get(SESSION_KEY) {
            Ok(Some(document)) => document,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read session state");
                return None;
            }
        };

        match serde_json::from_str(&document) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(error = %err, "stored session state is unreadable, ignoring it");
                None
            }
        }
    }
}
