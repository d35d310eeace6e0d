//! Core value types for the wylab compile-session client.
//!
//! Holds the request/response model shared by every other crate: request
//! and marker identifiers, the compile request, the tagged compile result,
//! structured error records, and the decoder that turns a raw server body
//! into a [`CompileResult`] or a [`ProtocolError`].

pub mod error;
pub mod id;
pub mod protocol;

// Re-export commonly used types
pub use error::ProtocolError;
pub use id::{MarkerId, RequestId};
pub use protocol::{CompileFlags, CompileRequest, CompileResult, ErrorRecord, Span};
