//! Client error types.

use wylab_session::{ExecutionError, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The latest request will never be answered.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// The HTTP client could not be set up.
    #[error("client setup failed: {0}")]
    Setup(String),
}
