//! Protocol error types for wylab-core.
//!
//! [`ProtocolError`] covers every way a server response can fail to be a
//! well-formed compile result. It is always surfaced as a single log line
//! and never aborts response handling.

use thiserror::Error;

/// A compile response that could not be interpreted.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body was not valid JSON.
    #[error("invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body was valid JSON but not an object.
    #[error("response is not a JSON object")]
    NotAnObject,

    /// The object carried no `result` field.
    #[error("response has no result tag")]
    MissingResultTag,

    /// The `result` field held something other than a known tag.
    #[error("unrecognized result tag: {0}")]
    UnknownResultTag(String),

    /// The tag was recognized but its payload fields were missing or mistyped.
    #[error("malformed '{tag}' response: {reason}")]
    MalformedBody { tag: &'static str, reason: String },

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}
