//! The compile-session controller and its collaborators.
//!
//! The [`Controller`](controller::Controller) owns the editable document and
//! drives one compile round trip at a time: it persists the submission,
//! hands the request to a [`CompileTransport`](transport::CompileTransport),
//! and interprets whatever the transport later delivers. Results are rendered
//! onto a [`TextWidget`](widget::TextWidget) by the
//! [`ErrorMapper`](mapper::ErrorMapper) and into the
//! [`MessageLog`](log::MessageLog).
//!
//! Every host capability is injected at construction; nothing is looked up
//! through global state.

pub mod controller;
pub mod execution;
pub mod log;
pub mod mapper;
pub mod transport;
pub mod widget;

pub use controller::{
    Controller, Document, FailureKind, RunOutcome, SessionStatus, DEFAULT_DOCUMENT,
};
pub use execution::{ExecutionError, ExecutionSink, ENTRY_POINT};
pub use log::{Message, MessageLog, MessageSeverity};
pub use mapper::{ErrorMapper, RenderSummary};
pub use transport::{CompileTransport, Delivery, TransportError};
pub use widget::{Annotation, BufferWidget, Marker, MarkerClass, Position, Range, Severity, TextWidget};
