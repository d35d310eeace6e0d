//! Wire model for the `/compile` endpoint.
//!
//! The request is a flat `{code, verify, counterexamples}` record. The
//! response is a JSON object whose `result` field selects exactly one of
//! three payloads:
//!
//! - `"success"` with `js`, the generated artifact
//! - `"errors"` with `errors`, an ordered list of error records
//! - `"exception"` with `text`, a server-side failure description
//!
//! [`CompileResult::decode`] matches the tag exhaustively; a missing or
//! unknown tag is a [`ProtocolError`], never a silent fall-through.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Configuration flags sent with every compile request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileFlags {
    /// Run the verifier in addition to compilation.
    pub verify: bool,
    /// Ask the verifier to search for counterexamples on failed assertions.
    pub counterexamples: bool,
}

/// Body of `POST /compile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub code: String,
    pub verify: bool,
    pub counterexamples: bool,
}

impl CompileRequest {
    pub fn new(code: impl Into<String>, flags: CompileFlags) -> Self {
        CompileRequest {
            code: code.into(),
            verify: flags.verify,
            counterexamples: flags.counterexamples,
        }
    }

    pub fn flags(&self) -> CompileFlags {
        CompileFlags {
            verify: self.verify,
            counterexamples: self.counterexamples,
        }
    }
}

/// A validated single-line source position.
///
/// `line` is 1-based; `start` and `end` are 0-based columns with
/// `start <= end`. `end` is inclusive on the wire, so it must leave room for
/// the exclusive column one past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Builds a span, returning `None` if `line < 1`, `start > end`, or
    /// `end` has no exclusive successor.
    pub fn new(line: u32, start: u32, end: u32) -> Option<Span> {
        if line < 1 || start > end || end == u32::MAX {
            return None;
        }
        Some(Span { line, start, end })
    }

    /// 0-based document row.
    pub fn row(&self) -> u32 {
        self.line - 1
    }

    /// Column one past the last highlighted character.
    pub fn end_exclusive(&self) -> u32 {
        self.end.saturating_add(1)
    }
}

/// One structured diagnostic from the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Diagnostic text as sent by the server.
    pub text: String,
    /// Position, present only when line, start and end were all valid.
    pub span: Option<Span>,
    /// Counterexample found by the verifier, if any.
    pub counterexample: Option<String>,
    /// Source file the diagnostic refers to, if the server named one.
    pub filename: Option<String>,
    /// Secondary diagnostics attached to this report.
    pub context: Vec<ErrorRecord>,
}

impl ErrorRecord {
    /// A positional-free record carrying only text.
    pub fn message(text: impl Into<String>) -> Self {
        ErrorRecord {
            text: text.into(),
            span: None,
            counterexample: None,
            filename: None,
            context: Vec::new(),
        }
    }

    /// A positioned record.
    pub fn at(text: impl Into<String>, span: Span) -> Self {
        ErrorRecord {
            span: Some(span),
            ..ErrorRecord::message(text)
        }
    }

    pub fn is_positioned(&self) -> bool {
        self.span.is_some()
    }

    /// The text with escaped `\n` sequences turned into line breaks.
    pub fn display_text(&self) -> String {
        self.text.replace("\\n", "\n")
    }

    /// Display text plus the counterexample after a blank line. Used for
    /// both the primary annotation and message-only reports.
    pub fn detail_text(&self) -> String {
        match &self.counterexample {
            Some(counterexample) => {
                format!("{}\n\ncounterexample: {}", self.display_text(), counterexample)
            }
            None => self.display_text(),
        }
    }
}

/// The outcome of one compile round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResult {
    /// Compilation succeeded; `artifact` is the generated program text.
    Success { artifact: String },
    /// Compilation produced diagnostics, in server order.
    Errors { errors: Vec<ErrorRecord> },
    /// The server failed internally.
    Exception { message: String },
}

impl CompileResult {
    /// Decodes a raw response body.
    pub fn decode(body: &str) -> Result<CompileResult, ProtocolError> {
        let value: Value = serde_json::from_str(body)?;
        CompileResult::from_value(value)
    }

    /// Decodes an already-parsed response object.
    pub fn from_value(value: Value) -> Result<CompileResult, ProtocolError> {
        let Value::Object(object) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let tag = match object.get("result") {
            None | Some(Value::Null) => return Err(ProtocolError::MissingResultTag),
            Some(Value::String(tag)) => tag.clone(),
            Some(other) => return Err(ProtocolError::UnknownResultTag(other.to_string())),
        };

        match tag.as_str() {
            "success" => {
                let body: SuccessBody = payload("success", object)?;
                Ok(CompileResult::Success { artifact: body.js })
            }
            "errors" => {
                let body: ErrorsBody = payload("errors", object)?;
                Ok(CompileResult::Errors {
                    errors: body.errors.into_iter().map(WireErrorRecord::into_record).collect(),
                })
            }
            "exception" => {
                let body: ExceptionBody = payload("exception", object)?;
                Ok(CompileResult::Exception {
                    message: body.text.unwrap_or_default(),
                })
            }
            _ => Err(ProtocolError::UnknownResultTag(tag)),
        }
    }

    /// The wire tag of this result.
    pub fn tag(&self) -> &'static str {
        match self {
            CompileResult::Success { .. } => "success",
            CompileResult::Errors { .. } => "errors",
            CompileResult::Exception { .. } => "exception",
        }
    }
}

fn payload<T: for<'de> Deserialize<'de>>(
    tag: &'static str,
    object: Map<String, Value>,
) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::Object(object)).map_err(|err| ProtocolError::MalformedBody {
        tag,
        reason: err.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    js: String,
}

#[derive(Debug, Deserialize)]
struct ErrorsBody {
    errors: Vec<WireErrorRecord>,
}

#[derive(Debug, Deserialize)]
struct ExceptionBody {
    #[serde(default)]
    text: Option<String>,
}

/// Error record as it appears on the wire, before position validation.
#[derive(Debug, Deserialize)]
struct WireErrorRecord {
    text: String,
    #[serde(default, deserialize_with = "lenient_position")]
    line: Option<i64>,
    #[serde(default, deserialize_with = "lenient_position")]
    start: Option<i64>,
    #[serde(default, deserialize_with = "lenient_position")]
    end: Option<i64>,
    #[serde(default)]
    counterexample: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    context: Vec<WireErrorRecord>,
}

impl WireErrorRecord {
    fn into_record(self) -> ErrorRecord {
        let span = match (self.line, self.start, self.end) {
            (None, None, None) => None,
            (Some(line), Some(start), Some(end)) => {
                let span = to_u32(line)
                    .zip(to_u32(start))
                    .zip(to_u32(end))
                    .and_then(|((line, start), end)| Span::new(line, start, end));
                if span.is_none() {
                    tracing::warn!(
                        line,
                        start,
                        end,
                        "error position out of range, reporting as message only"
                    );
                }
                span
            }
            (line, start, end) => {
                tracing::warn!(
                    ?line,
                    ?start,
                    ?end,
                    "error position partially present, reporting as message only"
                );
                None
            }
        };

        ErrorRecord {
            text: self.text,
            span,
            counterexample: self.counterexample,
            filename: self.filename,
            context: self.context.into_iter().map(WireErrorRecord::into_record).collect(),
        }
    }
}

fn to_u32(value: i64) -> Option<u32> {
    u32::try_from(value).ok()
}

/// Accepts a number, `null`, or a (possibly empty) numeric string.
fn lenient_position<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPosition {
        Number(i64),
        Text(String),
    }

    match Option::<RawPosition>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPosition::Number(n)) => Ok(Some(n)),
        Some(RawPosition::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawPosition::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid position '{}'", s))),
    }
}
