//! Test fixture for statement rollback integration tests
//!
//! Every fixture owns its own session and engine, so tests never share
//! state. Only the public crate API is used.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use statement_rollback::memory::{Command, MemoryHost};
use statement_rollback::{
    CallOrigin, Host, LogSettings, NestingSnapshot, Next, PipelineHook, RollbackConfig,
    RollbackResult, Session, TransactionPhase,
};

pub const AUTO: &str = "PgSLRAutoSvpt";

/// Session over the in-memory engine
pub struct TestFixture {
    session: Session<MemoryHost>,
}

impl TestFixture {
    /// Default configuration, rollback installed
    pub fn new() -> Self {
        Self::with_config(RollbackConfig::default())
    }

    pub fn with_config(config: RollbackConfig) -> Self {
        init_logging();
        let session = Session::builder(MemoryHost::new().with_log_settings(LogSettings::verbose()))
            .config(config)
            .with_statement_rollback()
            .build();
        Self { session }
    }

    /// Build from a ready session
    pub fn from_session(session: Session<MemoryHost>) -> Self {
        init_logging();
        Self { session }
    }

    /// Fixture with tables already created, outside any transaction
    pub fn with_tables(tables: &[&str]) -> Self {
        let fixture = Self::new();
        for table in tables {
            fixture.assert_succeeds(&Command::create_table(*table));
        }
        fixture.host().take_diagnostics();
        fixture
    }

    pub fn session(&self) -> &Session<MemoryHost> {
        &self.session
    }

    pub fn host(&self) -> &MemoryHost {
        self.session.host()
    }

    pub fn exec(&self, command: &Command) -> RollbackResult<()> {
        self.session.execute(command)
    }

    /// Execute and assert success; depth must be back to zero
    pub fn assert_succeeds(&self, command: &Command) {
        self.exec(command)
            .unwrap_or_else(|e| panic!("Statement failed: {:?}\nError: {}", command, e));
        self.assert_top_level();
    }

    /// Execute and assert failure with a matching message
    pub fn assert_fails(&self, command: &Command, expected_error: &str) {
        match self.exec(command) {
            Ok(()) => panic!("Statement should have failed: {:?}", command),
            Err(e) => assert!(
                e.to_string().contains(expected_error),
                "Expected error containing '{}', got: {}",
                expected_error,
                e
            ),
        }
        self.assert_top_level();
    }

    /// Counters and handoff slots are at rest between statements
    pub fn assert_top_level(&self) {
        let nesting = self.session.nesting();
        assert_eq!(nesting.executor_depth(), 0, "executor depth leaked");
        assert_eq!(nesting.planner_depth(), 0, "planner depth leaked");
        assert!(
            self.session.handoff().is_idle(),
            "handoff slots not empty: saved {:?}, pending {:?}",
            self.session.handoff().saved_scope(),
            self.session.handoff().pending_new_scope()
        );
        assert_eq!(self.host().open_portals(), 0, "statement memory leaked");
    }

    /// A pending automatic checkpoint exists in the engine as well
    pub fn assert_checkpoint_consistent(&self) {
        let transaction = self.session.transaction();
        if transaction.checkpoint_pending() {
            assert!(transaction.is_open());
            assert!(
                self.host().savepoint_names().iter().any(|name| name == AUTO),
                "pending checkpoint missing from engine: {:?}",
                self.host().savepoint_names()
            );
        }
    }

    pub fn assert_table(&self, table: &str, expected: &[i64]) {
        assert_eq!(
            self.host().table(table).as_deref(),
            Some(expected),
            "unexpected contents of {}",
            table
        );
    }

    pub fn phase(&self) -> TransactionPhase {
        self.session.phase()
    }

    pub fn savepoints(&self) -> Vec<String> {
        self.host().savepoint_names()
    }

    /// Statement-log lines written for automatic checkpoints
    pub fn checkpoint_log(&self) -> Vec<String> {
        self.host()
            .log_lines()
            .into_iter()
            .filter(|line| line.starts_with("statement:") && line.contains("automatic savepoint"))
            .collect()
    }

    pub fn count_log(&self, keyword: &str) -> usize {
        let prefix = format!("statement: {} ", keyword);
        self.checkpoint_log()
            .iter()
            .filter(|line| line.starts_with(&prefix))
            .count()
    }

    pub fn clear_diagnostics(&self) {
        self.host().take_diagnostics();
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One stage call seen by the recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCall {
    pub stage: &'static str,
    pub nesting: NestingSnapshot,
}

/// Records every stage passing through it along with the nesting counters
/// observed on entry
#[derive(Clone, Default)]
pub struct StageRecorder {
    calls: Rc<RefCell<Vec<StageCall>>>,
}

impl StageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StageCall> {
        self.calls.borrow().clone()
    }

    pub fn stages(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|call| call.stage).collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record<H: Host>(&self, session: &Session<H>, stage: &'static str) {
        self.calls.borrow_mut().push(StageCall {
            stage,
            nesting: session.nesting().snapshot(),
        });
    }
}

impl<H: Host> PipelineHook<H> for StageRecorder {
    fn name(&self) -> &'static str {
        "stage_recorder"
    }

    fn plan(&self, session: &Session<H>, query: &H::Query, next: Next<'_, H>) -> RollbackResult<H::Plan> {
        self.record(session, "plan");
        next.plan(query)
    }

    fn process_utility(
        &self,
        session: &Session<H>,
        statement: &H::Utility,
        origin: CallOrigin,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        self.record(session, "utility");
        next.process_utility(statement, origin)
    }

    fn executor_start(
        &self,
        session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        self.record(session, "start");
        next.executor_start(desc)
    }

    fn executor_run(
        &self,
        session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        self.record(session, "run");
        next.executor_run(desc)
    }

    fn executor_end(
        &self,
        session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        self.record(session, "end");
        next.executor_end(desc)
    }
}
