//! The boundary where a generated artifact is run.
//!
//! The artifact comes from the trusted compiler service and is executed
//! as-is. Nothing here inspects or sandboxes it.

use thiserror::Error;

/// Function invoked after the artifact has been loaded.
pub const ENTRY_POINT: &str = "main";

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Staging the artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The runtime could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The artifact ran and reported failure.
    #[error("artifact exited with {status}")]
    Failed { status: String },
}

/// Loads an artifact into the host environment and calls its entry point.
pub trait ExecutionSink {
    fn execute(&mut self, artifact: &str, entry_point: &str) -> Result<(), ExecutionError>;
}

impl<X: ExecutionSink + ?Sized> ExecutionSink for Box<X> {
    fn execute(&mut self, artifact: &str, entry_point: &str) -> Result<(), ExecutionError> {
        (**self).execute(artifact, entry_point)
    }
}
