//! Controller behaviour over in-memory host capabilities.
//!
//! The transport records dispatched requests instead of sending them, so
//! each test decides when (and in which order) responses arrive.

use proptest::prelude::*;
use serde_json::json;

use wylab_core::{CompileFlags, CompileRequest, CompileResult, ProtocolError, RequestId};
use wylab_session::{
    BufferWidget, CompileTransport, Controller, Delivery, ExecutionError, ExecutionSink,
    FailureKind, MarkerClass, MessageSeverity, Position, Range, RunOutcome, SessionStatus,
    TextWidget, TransportError, DEFAULT_DOCUMENT,
};
use wylab_storage::{InMemoryStore, KeyValueStore, SessionState, SessionStore, SESSION_KEY};

// ---------------------------------------------------------------------------
// Test hosts
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingTransport {
    sent: Vec<(RequestId, CompileRequest)>,
}

impl CompileTransport for RecordingTransport {
    fn dispatch(&mut self, id: RequestId, request: CompileRequest) {
        self.sent.push((id, request));
    }
}

#[derive(Default)]
struct RecordingSink {
    runs: Vec<(String, String)>,
    fail: bool,
}

impl ExecutionSink for RecordingSink {
    fn execute(&mut self, artifact: &str, entry_point: &str) -> Result<(), ExecutionError> {
        self.runs.push((artifact.to_string(), entry_point.to_string()));
        if self.fail {
            return Err(ExecutionError::Failed {
                status: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

type TestController = Controller<BufferWidget, InMemoryStore, RecordingTransport, RecordingSink>;

fn controller_with(store: SessionStore<InMemoryStore>) -> TestController {
    Controller::restore_on_startup(
        BufferWidget::new(),
        store,
        RecordingTransport::default(),
        RecordingSink::default(),
    )
}

fn controller() -> TestController {
    controller_with(SessionStore::new(InMemoryStore::new()))
}

fn flags(verify: bool) -> CompileFlags {
    CompileFlags {
        verify,
        counterexamples: false,
    }
}

fn decode(body: serde_json::Value) -> Result<CompileResult, ProtocolError> {
    CompileResult::from_value(body)
}

fn success() -> Result<CompileResult, ProtocolError> {
    decode(json!({"result": "success", "js": "function main(){}"}))
}

fn type_error() -> Result<CompileResult, ProtocolError> {
    decode(json!({
        "result": "errors",
        "errors": [{"text": "type error", "line": 3, "start": 2, "end": 5, "context": []}]
    }))
}

fn messages(c: &TestController) -> Vec<(MessageSeverity, String)> {
    c.log().iter().map(|m| (m.severity, m.text.clone())).collect()
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

#[test]
fn startup_without_session_uses_default_document() {
    let c = controller();
    assert_eq!(c.document().text(), DEFAULT_DOCUMENT);
    assert_eq!(c.widget().text(), DEFAULT_DOCUMENT);
    assert!(!c.flags().verify);
    assert!(!c.can_run());
    assert_eq!(c.status(), SessionStatus::Idle);
}

#[test]
fn startup_restores_saved_session() {
    let mut store = SessionStore::new(InMemoryStore::new());
    store.save(&SessionState {
        code: "function f() -> int:\n    return 1".to_string(),
        verify: true,
    });

    let c = controller_with(store);
    assert_eq!(c.widget().text(), "function f() -> int:\n    return 1");
    assert!(c.flags().verify);
    assert!(!c.flags().counterexamples);
    assert!(!c.document().is_dirty());
}

#[test]
fn startup_without_storage_uses_default_document() {
    let c = controller_with(SessionStore::unavailable());
    assert_eq!(c.document().text(), DEFAULT_DOCUMENT);
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[test]
fn submit_persists_and_dispatches_one_request() {
    let mut c = controller();
    c.edit("x");
    assert!(c.document().is_dirty());

    let id = c.submit(CompileFlags {
        verify: true,
        counterexamples: true,
    });

    assert_eq!(c.status(), SessionStatus::Pending(id));
    assert!(c.is_pending());
    assert!(!c.document().is_dirty());
    assert_eq!(
        c.transport().sent,
        vec![(
            id,
            CompileRequest {
                code: "x".to_string(),
                verify: true,
                counterexamples: true,
            }
        )]
    );

    let saved = c.store().backend().unwrap().get(SESSION_KEY).unwrap().unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved, json!({"code": "x", "verify": true}));
}

#[test]
fn request_ids_increase() {
    let mut c = controller();
    let a = c.submit(flags(false));
    let b = c.submit(flags(false));
    assert!(b > a);
    assert_eq!(c.last_issued(), Some(b));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn success_arms_run_and_logs_once() {
    let mut c = controller();
    c.edit("x");
    let id = c.submit(flags(false));
    c.on_response(id, success());

    assert!(c.can_run());
    assert_eq!(c.artifact(), Some("function main(){}"));
    assert_eq!(
        messages(&c),
        vec![(MessageSeverity::Success, "Compiled successfully!".to_string())]
    );
    assert!(c.widget().annotations().is_empty());
    assert_eq!(c.widget().marker_count(), 0);
    assert_eq!(c.status(), SessionStatus::Succeeded);
}

#[test]
fn positioned_error_is_annotated_underlined_and_logged() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_response(id, type_error());

    let annotations = c.widget().annotations();
    assert_eq!(annotations.len(), 1);
    assert_eq!((annotations[0].row, annotations[0].column), (2, 2));

    let markers: Vec<_> = c.widget().markers().collect();
    assert_eq!(markers.len(), 1);
    assert_eq!(
        markers[0].range,
        Range::new(Position::new(2, 2), Position::new(2, 6))
    );
    assert_eq!(markers[0].class, MarkerClass::ErrorMessage);

    let log = messages(&c);
    assert_eq!(log.len(), 1);
    assert!(log[0].1.contains("type error"));
    assert_eq!(log[0].0, MessageSeverity::Error);
    assert!(!c.can_run());
    assert_eq!(c.status(), SessionStatus::Failed(FailureKind::CompileErrors));
}

#[test]
fn unpositioned_error_is_one_plain_message() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_response(
        id,
        decode(json!({"result": "errors", "errors": [{"text": "unable to resolve", "context": []}]})),
    );

    assert_eq!(c.widget().marker_count(), 0);
    assert!(c.widget().annotations().is_empty());
    assert_eq!(
        messages(&c),
        vec![(MessageSeverity::Error, "unable to resolve".to_string())]
    );
}

#[test]
fn widest_wire_column_is_reported_without_underline() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_body(
        id,
        r#"{"result":"errors","errors":[{"text":"t","line":1,"start":0,"end":4294967295,"context":[]}]}"#,
    );

    assert_eq!(c.widget().marker_count(), 0);
    assert_eq!(messages(&c), vec![(MessageSeverity::Error, "t".to_string())]);
    assert_eq!(c.status(), SessionStatus::Failed(FailureKind::CompileErrors));
}

#[test]
fn exception_logs_failure_text() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_response(id, decode(json!({"result": "exception", "text": "boom"})));

    let log = messages(&c);
    assert_eq!(log.len(), 1);
    assert!(log[0].1.contains("boom"));
    assert!(!c.can_run());
    assert!(c.widget().annotations().is_empty());
    assert_eq!(c.status(), SessionStatus::Failed(FailureKind::ServerException));
}

#[test]
fn later_submission_wins_regardless_of_arrival_order() {
    let mut c = controller();
    let a = c.submit(flags(false));
    let b = c.submit(flags(false));

    c.on_response(b, type_error());
    c.on_response(a, success());

    assert!(!c.can_run());
    assert_eq!(c.artifact(), None);
    assert_eq!(c.widget().marker_count(), 1);
    assert_eq!(c.status(), SessionStatus::Failed(FailureKind::CompileErrors));
}

#[test]
fn superseded_response_arriving_first_is_ignored() {
    let mut c = controller();
    let a = c.submit(flags(false));
    let b = c.submit(flags(false));

    c.on_response(a, success());
    assert!(!c.can_run());
    assert_eq!(c.status(), SessionStatus::Pending(b));

    c.on_response(b, success());
    assert!(c.can_run());
}

#[test]
fn duplicate_response_is_ignored() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_response(id, success());
    c.edit("changed");
    c.on_response(id, success());
    assert!(!c.can_run());
    assert!(c.log().is_empty());
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[test]
fn edit_clears_results_and_disarms() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_response(id, type_error());
    assert_eq!(c.widget().marker_count(), 1);

    c.edit("fixed");
    assert_eq!(c.widget().marker_count(), 0);
    assert!(c.widget().annotations().is_empty());
    assert!(c.log().is_empty());
    assert!(!c.can_run());
    assert_eq!(c.status(), SessionStatus::Idle);

    c.on_edit();
    assert_eq!(c.widget().marker_count(), 0);
    assert!(c.log().is_empty());
    assert_eq!(c.document().text(), "fixed");
    assert!(c.transport().sent.len() == 1);
}

#[test]
fn edit_after_success_closes_run_gate() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_response(id, success());
    c.edit("y");
    assert!(!c.can_run());
    assert_eq!(c.run().unwrap(), RunOutcome::Disarmed);
    assert!(c.sink().runs.is_empty());
}

#[test]
fn edit_while_pending_keeps_request_current() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.edit("typing");
    assert_eq!(c.status(), SessionStatus::Pending(id));
    c.on_response(id, success());
    assert!(c.can_run());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn protocol_error_is_one_message() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_body(id, r#"{"result":"maybe"}"#);

    let log = messages(&c);
    assert_eq!(log.len(), 1);
    assert!(log[0].1.starts_with("Protocol error:"));
    assert!(!c.can_run());
    assert_eq!(c.widget().marker_count(), 0);
    assert_eq!(c.status(), SessionStatus::Failed(FailureKind::Protocol));
}

#[test]
fn transport_failure_leaves_pending() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.deliver(id, Delivery::Failed(TransportError::Request("connection refused".to_string())));

    assert_eq!(c.status(), SessionStatus::Pending(id));
    assert!(c.log().is_empty());

    let retry = c.submit(flags(false));
    c.deliver(retry, Delivery::from_body(r#"{"result":"success","js":"x"}"#));
    assert!(c.can_run());
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

#[test]
fn run_executes_artifact_with_entry_point() {
    let mut c = controller();
    let id = c.submit(flags(false));
    c.on_response(id, success());

    assert_eq!(c.run().unwrap(), RunOutcome::Executed);
    assert_eq!(c.run().unwrap(), RunOutcome::Executed);
    assert_eq!(
        c.sink().runs,
        vec![
            ("function main(){}".to_string(), "main".to_string()),
            ("function main(){}".to_string(), "main".to_string()),
        ]
    );
}

#[test]
fn run_refuses_before_any_success() {
    let mut c = controller();
    assert_eq!(c.run().unwrap(), RunOutcome::Disarmed);
    c.submit(flags(false));
    assert_eq!(c.run().unwrap(), RunOutcome::Disarmed);
    assert!(c.sink().runs.is_empty());
}

#[test]
fn execution_failure_propagates() {
    let mut c = Controller::restore_on_startup(
        BufferWidget::new(),
        SessionStore::new(InMemoryStore::new()),
        RecordingTransport::default(),
        RecordingSink {
            fail: true,
            ..RecordingSink::default()
        },
    );
    let id = c.submit(flags(false));
    c.on_response(id, success());

    assert!(matches!(c.run(), Err(ExecutionError::Failed { .. })));
    assert!(c.can_run());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Wire form of one error record with arbitrary (possibly absent) columns.
fn arb_wire_error(depth: u32) -> BoxedStrategy<serde_json::Value> {
    let position = (
        prop::option::of(any::<u32>()),
        prop::option::of(any::<u32>()),
        prop::option::of(any::<u32>()),
    );
    let leaf = ("[a-z ]{1,12}", position).prop_map(|(text, (line, start, end))| {
        json!({"text": text, "line": line, "start": start, "end": end, "context": []})
    });
    if depth == 0 {
        return leaf.boxed();
    }
    (leaf, prop::collection::vec(arb_wire_error(depth - 1), 0..3))
        .prop_map(|(mut record, context)| {
            record["context"] = serde_json::Value::Array(context);
            record
        })
        .boxed()
}

#[derive(Debug, Clone)]
enum Step {
    Edit,
    Submit,
    /// Deliver a success to the request at this index (mod issued count).
    Succeed(usize),
    /// Deliver compile errors to the request at this index.
    Fail(usize),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Edit),
        Just(Step::Submit),
        any::<usize>().prop_map(Step::Succeed),
        any::<usize>().prop_map(Step::Fail),
    ]
}

proptest! {
    #[test]
    fn any_error_list_renders_one_message_per_error(
        errors in prop::collection::vec(arb_wire_error(1), 1..6),
    ) {
        let count = errors.len();
        let body = json!({"result": "errors", "errors": errors}).to_string();

        let mut c = controller();
        let id = c.submit(flags(false));
        c.on_body(id, &body);

        prop_assert_eq!(c.log().len(), count);
        prop_assert_eq!(c.status(), SessionStatus::Failed(FailureKind::CompileErrors));
        for marker in c.widget().markers() {
            prop_assert_eq!(marker.range.start.row, marker.range.end.row);
            prop_assert!(marker.range.start.column < marker.range.end.column);
        }
    }

    #[test]
    fn only_the_latest_request_is_ever_rendered(steps in prop::collection::vec(arb_step(), 1..30)) {
        let mut c = controller();
        let mut issued: Vec<RequestId> = Vec::new();

        for step in steps {
            let before = c.status();
            match step {
                Step::Edit => {
                    c.on_edit();
                    prop_assert!(!c.can_run());
                }
                Step::Submit => issued.push(c.submit(flags(false))),
                Step::Succeed(_) | Step::Fail(_) if issued.is_empty() => {}
                Step::Succeed(i) => {
                    let id = issued[i % issued.len()];
                    c.on_response(id, success());
                    if before != SessionStatus::Pending(id) {
                        prop_assert_eq!(c.status(), before);
                    } else {
                        prop_assert!(c.can_run());
                    }
                }
                Step::Fail(i) => {
                    let id = issued[i % issued.len()];
                    c.on_response(id, type_error());
                    if before != SessionStatus::Pending(id) {
                        prop_assert_eq!(c.status(), before);
                    } else {
                        prop_assert!(!c.can_run());
                    }
                }
            }

            if let SessionStatus::Pending(id) = c.status() {
                prop_assert_eq!(Some(id), issued.last().copied());
            }
        }

        prop_assert_eq!(c.transport().sent.len(), issued.len());
    }
}
