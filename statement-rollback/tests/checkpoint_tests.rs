//! Checkpoint manager preconditions and the diagnostic chain

#[path = "testutils/mod.rs"]
mod testutils;

use std::cell::RefCell;
use std::rc::Rc;

use statement_rollback::memory::{Command, MemoryHost};
use statement_rollback::{
    Diagnostic, DiagnosticHook, DiagnosticNext, Host, LogSettings, RollbackError, Session,
    Severity,
};
use testutils::test_fixture::{TestFixture, AUTO};

fn assert_internal(result: Result<(), RollbackError>, expected: &str) {
    match result {
        Err(RollbackError::Internal(message)) => assert!(
            message.contains(expected),
            "Expected internal error containing '{}', got: {}",
            expected,
            message
        ),
        other => panic!("Expected internal error, got: {:?}", other),
    }
}

#[test]
fn test_release_without_pending_checkpoint_is_noop() {
    let fixture = TestFixture::with_tables(&["t"]);
    let checkpoints = fixture.session().checkpoints();

    assert!(checkpoints.release_checkpoint().is_ok());
    assert!(checkpoints.restore_scope().is_ok());
    assert!(!checkpoints.discard_saved_scope());
    assert!(fixture.checkpoint_log().is_empty());
}

#[test]
fn test_operations_refuse_nested_levels() {
    let fixture = TestFixture::with_tables(&["t"]);
    fixture.assert_succeeds(&Command::begin());
    let session = fixture.session();

    let guard = session.nesting().enter_executor();
    assert_internal(session.checkpoints().save_scope(), "nesting level 1");
    assert_internal(session.checkpoints().add_checkpoint(), "nesting level 1");
    assert_internal(session.checkpoints().release_checkpoint(), "nesting level 1");
    drop(guard);

    assert_eq!(fixture.savepoints(), vec![AUTO.to_string()]);
    assert!(session.handoff().is_idle());
}

#[test]
fn test_double_save_is_rejected() {
    let fixture = TestFixture::with_tables(&["t"]);
    fixture.assert_succeeds(&Command::begin());
    let checkpoints = fixture.session().checkpoints();

    checkpoints.save_scope().unwrap();
    assert_eq!(
        fixture.session().handoff().saved_scope(),
        Some(fixture.host().active_scope())
    );
    assert_internal(checkpoints.save_scope(), "already saved");

    assert!(checkpoints.discard_saved_scope());
    assert!(!checkpoints.discard_saved_scope());
}

#[test]
fn test_save_outside_transaction_saves_nothing() {
    let fixture = TestFixture::with_tables(&["t"]);
    let checkpoints = fixture.session().checkpoints();

    assert!(!checkpoints.active());
    checkpoints.save_scope().unwrap();
    assert!(fixture.session().handoff().is_idle());
    // Nothing to do without a transaction block
    checkpoints.add_checkpoint().unwrap();
    assert!(fixture.savepoints().is_empty());
}

#[test]
fn test_add_without_saved_scope_is_internal_error() {
    let fixture = TestFixture::with_tables(&["t"]);
    fixture.assert_succeeds(&Command::begin());

    assert_internal(
        fixture.session().checkpoints().add_checkpoint(),
        "no resource owner.",
    );
    assert!(fixture.session().handoff().is_idle());
}

#[test]
fn test_add_without_statement_memory_is_internal_error() {
    let fixture = TestFixture::with_tables(&["t"]);
    fixture.assert_succeeds(&Command::begin());
    let checkpoints = fixture.session().checkpoints();

    // Between statements there is no statement memory to attach the
    // restore to
    checkpoints.save_scope().unwrap();
    assert_eq!(
        fixture.session().handoff().saved().map(|saved| saved.statement_memory),
        Some(None)
    );
    assert_internal(checkpoints.add_checkpoint(), "no portal context.");
    assert!(fixture.session().handoff().is_idle());
}

#[test]
fn test_internal_error_is_reported_as_fatal() {
    let fixture = TestFixture::with_tables(&["t"]);
    fixture.assert_succeeds(&Command::begin());
    fixture.session().checkpoints().save_scope().unwrap();

    // The leftover saved scope makes the next top-level statement fail
    let err = fixture.exec(&Command::insert("t", [1])).unwrap_err();
    assert!(err.is_fatal());
    assert!(fixture
        .host()
        .diagnostics()
        .iter()
        .any(|diag| diag.severity == Severity::Fatal && diag.message.contains("already saved")));
    fixture.assert_top_level();
}

/// Diagnostic hook keeping a copy of every message it forwards
#[derive(Clone, Default)]
struct DiagnosticRecorder {
    seen: Rc<RefCell<Vec<Diagnostic>>>,
}

impl<H: Host> DiagnosticHook<H> for DiagnosticRecorder {
    fn name(&self) -> &'static str {
        "diagnostic_recorder"
    }

    fn emit(&self, _session: &Session<H>, diagnostic: &mut Diagnostic, next: DiagnosticNext<'_, H>) {
        self.seen.borrow_mut().push(diagnostic.clone());
        next.emit(diagnostic)
    }
}

#[test]
fn test_diagnostic_chain_reaches_every_hook_and_host() {
    let recorder = DiagnosticRecorder::default();
    let session = Session::builder(MemoryHost::new().with_log_settings(LogSettings::verbose()))
        .diagnostic_hook(recorder.clone())
        .with_statement_rollback()
        .build();
    let fixture = TestFixture::from_session(session);

    fixture.assert_succeeds(&Command::create_table("t"));
    fixture.assert_succeeds(&Command::begin());
    fixture.assert_fails(&Command::fail("boom"), "boom");

    let seen = recorder.seen.borrow();
    assert_eq!(seen.as_slice(), fixture.host().diagnostics().as_slice());
    assert!(seen
        .iter()
        .any(|diag| diag.severity == Severity::Error && diag.message == "boom"));

    // Checkpoint log lines never carry the statement text
    assert!(seen
        .iter()
        .filter(|diag| diag.severity == Severity::Log)
        .all(|diag| diag.hide_statement));
}

#[test]
fn test_reported_error_drops_stale_intents() {
    let fixture = TestFixture::with_tables(&["t"]);
    fixture.assert_succeeds(&Command::begin());
    let session = fixture.session();

    session.checkpoints().save_scope().unwrap();
    session.report(Diagnostic::new(Severity::Warning, "just a warning"));
    assert!(session.handoff().saved().is_some());

    session.report(Diagnostic::error("statement failed"));
    assert!(session.handoff().is_idle());
}
