//! The compile-session controller.
//!
//! [`Controller`] is a single-threaded state machine. It owns the document,
//! the message log, the error mapper and the run gate, and holds every host
//! capability it uses (widget, storage, transport, execution sink) as an
//! injected value.
//!
//! # Transitions
//!
//! - edit: clear annotations and messages, disarm run
//! - submit: persist `{code, verify}`, clear, disarm, go pending, dispatch
//! - delivery for the latest request: render it, leave pending
//! - delivery for any older request: dropped
//!
//! Request IDs increase monotonically, so whichever submission was issued
//! last is the only one whose result is ever rendered, whatever order the
//! network completes them in. Superseded requests are not cancelled; their
//! results are ignored when they arrive.

use wylab_core::{CompileFlags, CompileRequest, CompileResult, ProtocolError, RequestId};
use wylab_storage::{KeyValueStore, SessionState, SessionStore};

use crate::execution::{ExecutionError, ExecutionSink, ENTRY_POINT};
use crate::log::{MessageLog, MessageSeverity};
use crate::mapper::ErrorMapper;
use crate::transport::{CompileTransport, Delivery, TransportError};
use crate::widget::TextWidget;

/// Document used when no session has been saved.
pub const DEFAULT_DOCUMENT: &str =
    "import std::io\nimport std::ascii\n\nmethod main():\n    io::println(\"hello world\")";

/// The editable source text and whether it changed since the last submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    dirty: bool,
}

impl Document {
    fn clean(text: String) -> Self {
        Document { text, dirty: false }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Why the last resolved request did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    CompileErrors,
    ServerException,
    Protocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing in flight and nothing shown.
    Idle,
    /// A request is in flight; the pending indicator is showing.
    Pending(RequestId),
    Succeeded,
    Failed(FailureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Executed,
    /// The run gate was closed; nothing was executed.
    Disarmed,
}

pub struct Controller<W, S, T, X> {
    widget: W,
    store: SessionStore<S>,
    transport: T,
    sink: X,
    document: Document,
    flags: CompileFlags,
    log: MessageLog,
    mapper: ErrorMapper,
    last_issued: Option<RequestId>,
    status: SessionStatus,
    artifact: Option<String>,
    run_armed: bool,
}

impl<W, S, T, X> Controller<W, S, T, X>
where
    W: TextWidget,
    S: KeyValueStore,
    T: CompileTransport,
    X: ExecutionSink,
{
    /// Builds the controller from the saved session, or from
    /// [`DEFAULT_DOCUMENT`] with verification off when there is none.
    ///
    /// The run gate starts closed.
    pub fn restore_on_startup(
        mut widget: W,
        store: SessionStore<S>,
        transport: T,
        sink: X,
    ) -> Self {
        let state = store.load().unwrap_or_else(|| {
            tracing::debug!("no saved session, using default document");
            SessionState {
                code: DEFAULT_DOCUMENT.to_string(),
                verify: false,
            }
        });

        widget.set_text(&state.code);
        let flags = CompileFlags {
            verify: state.verify,
            counterexamples: false,
        };

        Controller {
            widget,
            store,
            transport,
            sink,
            document: Document::clean(state.code),
            flags,
            log: MessageLog::new(),
            mapper: ErrorMapper::new(),
            last_issued: None,
            status: SessionStatus::Idle,
            artifact: None,
            run_armed: false,
        }
    }

    // -------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------

    /// Called after every change to the widget text.
    ///
    /// Clears annotations and messages and closes the run gate. An in-flight
    /// request stays in flight. Calling this repeatedly has the same effect
    /// as calling it once.
    pub fn on_edit(&mut self) {
        let text = self.widget.text();
        if text != self.document.text {
            self.document.text = text;
            self.document.dirty = true;
        }

        self.clear_view();
        self.run_armed = false;
        if matches!(self.status, SessionStatus::Succeeded | SessionStatus::Failed(_)) {
            self.status = SessionStatus::Idle;
        }
    }

    /// Replaces the widget text and handles it as an edit.
    pub fn edit(&mut self, text: &str) {
        self.widget.set_text(text);
        self.on_edit();
    }

    // -------------------------------------------------------------------
    // Compiling
    // -------------------------------------------------------------------

    /// Submits the current document with `flags`.
    ///
    /// Returns as soon as the transport has been handed the request. Any
    /// request issued earlier is superseded.
    pub fn submit(&mut self, flags: CompileFlags) -> RequestId {
        self.flags = flags;
        self.document.text = self.widget.text();
        self.document.dirty = false;

        self.store.save(&SessionState {
            code: self.document.text.clone(),
            verify: flags.verify,
        });

        self.clear_view();
        self.artifact = None;
        self.run_armed = false;

        let id = self.last_issued.map_or(RequestId(1), RequestId::next);
        if let SessionStatus::Pending(previous) = self.status {
            tracing::debug!(%previous, superseded_by = %id, "superseding in-flight request");
        }
        self.last_issued = Some(id);
        self.status = SessionStatus::Pending(id);

        tracing::info!(
            request = %id,
            verify = flags.verify,
            counterexamples = flags.counterexamples,
            bytes = self.document.text.len(),
            "submitting compile request"
        );
        self.transport
            .dispatch(id, CompileRequest::new(self.document.text.clone(), flags));
        id
    }

    /// Submits with the controller's current flags.
    pub fn compile(&mut self) -> RequestId {
        self.submit(self.flags)
    }

    /// Routes a transport delivery for request `id`.
    pub fn deliver(&mut self, id: RequestId, delivery: Delivery) {
        match delivery {
            Delivery::Response(response) => self.on_response(id, response),
            Delivery::Failed(err) => self.on_transport_failure(id, err),
        }
    }

    /// Decodes a raw response body for request `id` and handles it.
    pub fn on_body(&mut self, id: RequestId, body: &str) {
        self.on_response(id, CompileResult::decode(body));
    }

    /// Handles the response to request `id`.
    ///
    /// Responses to anything but the latest, still-pending request are
    /// dropped. A protocol error becomes one log message; it never escapes.
    pub fn on_response(&mut self, id: RequestId, response: Result<CompileResult, ProtocolError>) {
        if !self.is_current(id) {
            tracing::debug!(request = %id, "dropping stale response");
            return;
        }

        self.clear_view();

        match response {
            Ok(CompileResult::Success { artifact }) => {
                tracing::info!(request = %id, bytes = artifact.len(), "compiled successfully");
                self.artifact = Some(artifact);
                self.run_armed = true;
                self.log
                    .append(MessageSeverity::Success, "Compiled successfully!");
                self.status = SessionStatus::Succeeded;
            }
            Ok(CompileResult::Errors { errors }) => {
                tracing::info!(request = %id, count = errors.len(), "compilation failed");
                self.artifact = None;
                self.run_armed = false;
                self.mapper.render(&mut self.widget, &mut self.log, &errors);
                // Message-only errors were already logged by the mapper.
                for error in errors.iter().filter(|e| e.is_positioned()) {
                    self.log.append(
                        MessageSeverity::Error,
                        format!("Compilation failed: {}", error.display_text()),
                    );
                }
                self.status = SessionStatus::Failed(FailureKind::CompileErrors);
            }
            Ok(CompileResult::Exception { message }) => {
                tracing::warn!(request = %id, %message, "compiler service raised an exception");
                self.artifact = None;
                self.run_armed = false;
                self.log
                    .append(MessageSeverity::Error, format!("Internal failure: {}", message));
                self.status = SessionStatus::Failed(FailureKind::ServerException);
            }
            Err(err) => {
                tracing::warn!(request = %id, error = %err, "unusable compile response");
                self.artifact = None;
                self.run_armed = false;
                self.log
                    .append(MessageSeverity::Error, format!("Protocol error: {}", err));
                self.status = SessionStatus::Failed(FailureKind::Protocol);
            }
        }
    }

    /// Records that request `id` will never be answered.
    ///
    /// Nothing is retried and the pending indicator stays; the next
    /// submission replaces it.
    pub fn on_transport_failure(&mut self, id: RequestId, err: TransportError) {
        if !self.is_current(id) {
            tracing::debug!(request = %id, error = %err, "ignoring failure of superseded request");
            return;
        }
        tracing::warn!(request = %id, error = %err, "compile request failed, still pending");
    }

    // -------------------------------------------------------------------
    // Running
    // -------------------------------------------------------------------

    /// Executes the last successful artifact and calls its entry point.
    ///
    /// Refuses when the run gate is closed. Execution errors are returned
    /// unhandled; the controller's state is unchanged either way.
    pub fn run(&mut self) -> Result<RunOutcome, ExecutionError> {
        let artifact = match (&self.artifact, self.run_armed) {
            (Some(artifact), true) => artifact,
            _ => {
                tracing::debug!("run requested while disarmed, ignoring");
                return Ok(RunOutcome::Disarmed);
            }
        };

        tracing::info!(entry = ENTRY_POINT, "executing compiled artifact");
        self.sink.execute(artifact, ENTRY_POINT)?;
        Ok(RunOutcome::Executed)
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn flags(&self) -> CompileFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: CompileFlags) {
        self.flags = flags;
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Whether the pending indicator is showing.
    pub fn is_pending(&self) -> bool {
        matches!(self.status, SessionStatus::Pending(_))
    }

    /// The run gate.
    pub fn can_run(&self) -> bool {
        self.run_armed
    }

    /// The artifact from the last successful compile, if it is still current.
    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn last_issued(&self) -> Option<RequestId> {
        self.last_issued
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &X {
        &self.sink
    }

    fn is_current(&self, id: RequestId) -> bool {
        self.status == SessionStatus::Pending(id)
    }

    fn clear_view(&mut self) {
        self.mapper.clear_all(&mut self.widget);
        self.log.clear();
    }
}
