// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The in-memory engine
//!
//! Tables are plain integer lists. Transaction blocks and savepoints keep
//! full copies of the tables taken when they start. Every savepoint owns an
//! ownership scope; executor resources must be released under the scope
//! they were acquired in.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::LogSettings;
use crate::error::{RollbackError, RollbackResult};
use crate::host::{
    CallOrigin, Diagnostic, Host, MemoryId, ScopeId, Severity, TeardownCallback, TransactionStmt,
};
use crate::session::Session;

use super::commands::{
    Command, FailStage, Function, MemoryPlan, MemoryQuery, MemoryQueryDesc, MemoryUtility,
};

/// Scope active outside of any transaction
pub const SESSION_SCOPE: ScopeId = ScopeId::new(0);

type Tables = BTreeMap<String, Vec<i64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockState {
    /// BEGIN has run but was not finalized yet
    Begun,
    InProgress,
}

#[derive(Debug, Clone)]
struct SavepointEntry {
    name: String,
    snapshot: Tables,
    scope: ScopeId,
    parent_scope: ScopeId,
}

#[derive(Debug, Clone)]
struct TransactionBlock {
    /// Started by the engine for a single statement
    implicit: bool,
    state: BlockState,
    snapshot: Tables,
    savepoints: Vec<SavepointEntry>,
    aborted: bool,
    top_scope: ScopeId,
}

struct Portal {
    memory: MemoryId,
    callbacks: Vec<TeardownCallback<MemoryHost>>,
}

struct Cursor {
    desc: MemoryQueryDesc,
    scope: ScopeId,
}

#[derive(Default)]
struct EngineState {
    tables: Tables,
    txn: Option<TransactionBlock>,
    next_scope: u64,
    next_memory: u64,
    active_scope: Option<ScopeId>,
    portals: Vec<Portal>,
    cursors: BTreeMap<String, Cursor>,
    prepared: BTreeMap<String, Tables>,
    diagnostics: Vec<Diagnostic>,
    command_counter: u64,
    last_rows: Vec<i64>,
}

impl EngineState {
    fn allocate_scope(&mut self) -> ScopeId {
        self.next_scope += 1;
        ScopeId::new(self.next_scope)
    }

    fn active_scope(&self) -> ScopeId {
        self.active_scope.unwrap_or(SESSION_SCOPE)
    }

    fn block(&self) -> Option<&TransactionBlock> {
        self.txn.as_ref().filter(|txn| !txn.implicit)
    }

    fn block_mut(&mut self, command: &str) -> RollbackResult<&mut TransactionBlock> {
        match self.txn.as_mut() {
            Some(txn) if !txn.implicit => Ok(txn),
            _ => Err(RollbackError::statement(format!(
                "{} can only be used in transaction blocks",
                command
            ))),
        }
    }

    fn table_mut(&mut self, name: &str) -> RollbackResult<&mut Vec<i64>> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| RollbackError::statement(format!("relation \"{}\" does not exist", name)))
    }

    fn end_transaction(&mut self) {
        self.txn = None;
        self.cursors.clear();
        self.active_scope = None;
    }

    fn define_savepoint(&mut self, name: &str) -> RollbackResult<()> {
        let parent_scope = self.active_scope();
        let snapshot = self.tables.clone();
        let scope = self.allocate_scope();
        let block = self.block_mut("SAVEPOINT")?;
        if block.aborted {
            return Err(aborted_error());
        }
        if block.state == BlockState::Begun {
            return Err(RollbackError::internal(
                "DefineSavepoint: unexpected state BEGIN",
            ));
        }
        block.savepoints.push(SavepointEntry {
            name: name.to_string(),
            snapshot,
            scope,
            parent_scope,
        });
        self.active_scope = Some(scope);
        Ok(())
    }

    fn release_savepoint(&mut self, name: &str) -> RollbackResult<()> {
        let block = self.block_mut("RELEASE SAVEPOINT")?;
        if block.aborted {
            return Err(aborted_error());
        }
        let idx = block
            .savepoints
            .iter()
            .rposition(|entry| entry.name == name)
            .ok_or_else(|| no_such_savepoint(name))?;
        let parent_scope = block.savepoints[idx].parent_scope;
        block.savepoints.truncate(idx);
        self.active_scope = Some(parent_scope);
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> RollbackResult<()> {
        let scope = self.allocate_scope();
        let block = self.block_mut("ROLLBACK TO SAVEPOINT")?;
        let idx = block
            .savepoints
            .iter()
            .rposition(|entry| entry.name == name)
            .ok_or_else(|| no_such_savepoint(name))?;
        block.savepoints.truncate(idx + 1);
        block.aborted = false;
        // The savepoint survives with a fresh scope
        let entry = &mut block.savepoints[idx];
        entry.scope = scope;
        let snapshot = entry.snapshot.clone();
        self.tables = snapshot;
        self.active_scope = Some(scope);
        Ok(())
    }
}

fn aborted_error() -> RollbackError {
    RollbackError::statement(
        "current transaction is aborted, commands ignored until end of transaction block",
    )
}

fn no_such_savepoint(name: &str) -> RollbackError {
    RollbackError::statement(format!("savepoint \"{}\" does not exist", name))
}

/// Single-session in-memory engine
///
/// Prepared transactions keep their changes in the shared tables;
/// ROLLBACK PREPARED restores the tables as they were when the prepared
/// transaction began.
pub struct MemoryHost {
    state: RefCell<EngineState>,
    parallel_worker: Cell<bool>,
    log_settings: Cell<LogSettings>,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("parallel_worker", &self.parallel_worker.get())
            .field("log_settings", &self.log_settings.get())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(EngineState::default()),
            parallel_worker: Cell::new(false),
            log_settings: Cell::new(LogSettings::default()),
        }
    }

    pub fn with_log_settings(self, settings: LogSettings) -> Self {
        self.log_settings.set(settings);
        self
    }

    pub fn set_log_settings(&self, settings: LogSettings) {
        self.log_settings.set(settings);
    }

    /// Pretend the session is a parallel worker
    pub fn set_parallel_worker(&self, parallel: bool) {
        self.parallel_worker.set(parallel);
    }

    fn state(&self) -> Ref<'_, EngineState> {
        self.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, EngineState> {
        self.state.borrow_mut()
    }

    // Inspection

    pub fn table(&self, name: &str) -> Option<Vec<i64>> {
        self.state().tables.get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.state().tables.keys().cloned().collect()
    }

    /// An explicit transaction block is open
    pub fn in_transaction_block(&self) -> bool {
        self.state().block().is_some()
    }

    pub fn block_state(&self) -> Option<BlockState> {
        self.state().block().map(|block| block.state)
    }

    pub fn is_aborted(&self) -> bool {
        self.state().block().is_some_and(|block| block.aborted)
    }

    /// Names of the savepoints of the open block, oldest first
    pub fn savepoint_names(&self) -> Vec<String> {
        self.state()
            .block()
            .map(|block| block.savepoints.iter().map(|sp| sp.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Scope owned by the innermost savepoint, or by the transaction
    pub fn innermost_scope(&self) -> Option<ScopeId> {
        self.state().txn.as_ref().map(|txn| {
            txn.savepoints
                .last()
                .map(|sp| sp.scope)
                .unwrap_or(txn.top_scope)
        })
    }

    pub fn cursor_names(&self) -> Vec<String> {
        self.state().cursors.keys().cloned().collect()
    }

    pub fn prepared_transactions(&self) -> Vec<String> {
        self.state().prepared.keys().cloned().collect()
    }

    pub fn open_portals(&self) -> usize {
        self.state().portals.len()
    }

    pub fn command_counter(&self) -> u64 {
        self.state().command_counter
    }

    /// Rows returned by the last top-level query or FETCH
    pub fn last_rows(&self) -> Vec<i64> {
        self.state().last_rows.clone()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.state().diagnostics.clone()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.state_mut().diagnostics)
    }

    /// Messages of the diagnostics sent at LOG severity
    pub fn log_lines(&self) -> Vec<String> {
        self.state()
            .diagnostics
            .iter()
            .filter(|diag| diag.severity == Severity::Log)
            .map(|diag| diag.message.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.state()
            .diagnostics
            .iter()
            .filter(|diag| diag.aborts_statement())
            .map(|diag| diag.message.clone())
            .collect()
    }

    // Statement lifecycle, driven by `Session::execute`

    pub(crate) fn check_not_aborted(&self, command: &Command) -> RollbackResult<()> {
        if self.is_aborted() && !command.allowed_in_aborted_block() {
            return Err(aborted_error());
        }
        Ok(())
    }

    /// Start an implicit transaction if needed and open the statement memory
    pub(crate) fn begin_statement(&self) -> MemoryId {
        let mut state = self.state_mut();
        if state.txn.is_none() {
            let top_scope = state.allocate_scope();
            let snapshot = state.tables.clone();
            state.txn = Some(TransactionBlock {
                implicit: true,
                state: BlockState::InProgress,
                snapshot,
                savepoints: Vec::new(),
                aborted: false,
                top_scope,
            });
            state.active_scope = Some(top_scope);
        }
        state.next_memory += 1;
        let memory = MemoryId::new(state.next_memory);
        state.portals.push(Portal {
            memory,
            callbacks: Vec::new(),
        });
        memory
    }

    pub(crate) fn set_last_rows(&self, rows: Vec<i64>) {
        self.state_mut().last_rows = rows;
    }

    /// Abort the work of a failed statement
    pub(crate) fn abort_statement(&self) {
        let mut state = self.state_mut();
        let implicit = match state.txn.as_mut() {
            Some(txn) if txn.implicit => true,
            Some(txn) => {
                log::debug!("transaction block aborted");
                txn.aborted = true;
                false
            }
            None => false,
        };
        if implicit {
            if let Some(txn) = state.txn.take() {
                state.tables = txn.snapshot;
            }
            state.end_transaction();
        }
    }

    /// Tear down the statement memory, running its callbacks in
    /// registration order
    pub(crate) fn close_statement(
        &self,
        session: &Session<MemoryHost>,
        memory: MemoryId,
    ) -> RollbackResult<()> {
        let callbacks = {
            let mut state = self.state_mut();
            match state.portals.iter().rposition(|portal| portal.memory == memory) {
                Some(idx) => state.portals.remove(idx).callbacks,
                None => {
                    return Err(RollbackError::internal(format!(
                        "statement memory {} is already torn down",
                        memory
                    )))
                }
            }
        };

        let mut result = Ok(());
        for callback in callbacks {
            if let Err(err) = callback(session) {
                log::error!("teardown callback failed: {}", err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    /// Finish the statement: commit an implicit transaction, finalize a
    /// freshly begun block
    pub(crate) fn finish_statement(&self) {
        let mut state = self.state_mut();
        state.command_counter += 1;
        let implicit = state.txn.as_ref().is_some_and(|txn| txn.implicit);
        if implicit {
            state.end_transaction();
        } else if let Some(txn) = state.txn.as_mut() {
            if txn.state == BlockState::Begun {
                txn.state = BlockState::InProgress;
            }
        }
    }

    // Execution helpers

    fn plan_query(
        &self,
        session: &Session<MemoryHost>,
        query: &MemoryQuery,
    ) -> RollbackResult<MemoryPlan> {
        let mut range_table = query.own_range_table();
        let mut subplans = Vec::new();

        match query {
            MemoryQuery::Fail {
                message,
                stage: FailStage::Plan,
            } => return Err(RollbackError::statement(message.clone())),
            MemoryQuery::Insert { table, .. }
            | MemoryQuery::Update { table, .. }
            | MemoryQuery::Delete { table }
            | MemoryQuery::SelectForUpdate { table } => self.require_table(table)?,
            MemoryQuery::Select { tables } => {
                for table in tables {
                    self.require_table(table)?;
                }
            }
            MemoryQuery::View { query, .. } => {
                let subplan = session.plan(query)?;
                range_table.extend(subplan.range_table.iter().cloned());
                subplans.push(subplan);
            }
            MemoryQuery::CallFunction(function) if function.plan_time => {
                log::debug!("folding function {} while planning", function.name);
                self.run_function(session, function)?;
            }
            MemoryQuery::CallFunction(_) | MemoryQuery::Fail { .. } => {}
        }

        Ok(MemoryPlan {
            query: query.clone(),
            command: query.command_type(),
            range_table,
            subplans,
        })
    }

    fn require_table(&self, name: &str) -> RollbackResult<()> {
        if self.state().tables.contains_key(name) {
            Ok(())
        } else {
            Err(RollbackError::statement(format!(
                "relation \"{}\" does not exist",
                name
            )))
        }
    }

    fn run_plan(
        &self,
        session: &Session<MemoryHost>,
        plan: &MemoryPlan,
    ) -> RollbackResult<Vec<i64>> {
        match &plan.query {
            MemoryQuery::CallFunction(function) if !function.plan_time => {
                self.run_function(session, function)?;
                Ok(Vec::new())
            }
            MemoryQuery::CallFunction(_) => Ok(Vec::new()),
            MemoryQuery::View { .. } => {
                let mut rows = Vec::new();
                for subplan in &plan.subplans {
                    rows.extend(self.run_plan(session, subplan)?);
                }
                Ok(rows)
            }
            MemoryQuery::Fail { message, .. } => Err(RollbackError::statement(message.clone())),
            query => self.apply(query),
        }
    }

    /// Apply a data statement to the tables
    fn apply(&self, query: &MemoryQuery) -> RollbackResult<Vec<i64>> {
        let mut state = self.state_mut();
        match query {
            MemoryQuery::Select { tables } => {
                let mut rows = Vec::new();
                for table in tables {
                    rows.extend(state.table_mut(table)?.iter().copied());
                }
                Ok(rows)
            }
            MemoryQuery::SelectForUpdate { table } => Ok(state.table_mut(table)?.clone()),
            MemoryQuery::Insert { table, values } => {
                state.table_mut(table)?.extend(values.iter().copied());
                Ok(Vec::new())
            }
            MemoryQuery::Update { table, delta } => {
                for value in state.table_mut(table)?.iter_mut() {
                    *value += delta;
                }
                Ok(Vec::new())
            }
            MemoryQuery::Delete { table } => {
                state.table_mut(table)?.clear();
                Ok(Vec::new())
            }
            MemoryQuery::CallFunction(_) | MemoryQuery::View { .. } | MemoryQuery::Fail { .. } => {
                Ok(Vec::new())
            }
        }
    }

    /// Run a function body statement by statement, each one nested inside
    /// the caller
    fn run_function(&self, session: &Session<MemoryHost>, function: &Function) -> RollbackResult<()> {
        log::debug!("running function {}", function.name);
        for command in &function.body {
            match command {
                Command::Query(query) => {
                    run_query(session, query)?;
                }
                Command::Utility(utility) => {
                    session.process_utility(utility, CallOrigin::Internal)?;
                }
            }
        }
        Ok(())
    }

    fn process_transaction(
        &self,
        session: &Session<MemoryHost>,
        stmt: &TransactionStmt,
    ) -> RollbackResult<()> {
        let mut state = self.state_mut();
        match stmt {
            TransactionStmt::Begin | TransactionStmt::Start => {
                if state.block().is_some() {
                    drop(state);
                    session.report(Diagnostic::new(
                        Severity::Warning,
                        "there is already a transaction in progress",
                    ));
                    return Ok(());
                }
                let txn = state
                    .txn
                    .as_mut()
                    .ok_or_else(|| RollbackError::internal("no transaction for BEGIN"))?;
                txn.implicit = false;
                txn.state = BlockState::Begun;
                Ok(())
            }
            TransactionStmt::Commit => {
                let Some(block) = state.block().cloned() else {
                    drop(state);
                    session.report(Diagnostic::new(
                        Severity::Warning,
                        "there is no transaction in progress",
                    ));
                    return Ok(());
                };
                if block.aborted {
                    state.tables = block.snapshot;
                }
                state.end_transaction();
                Ok(())
            }
            TransactionStmt::Rollback => {
                let Some(block) = state.block().cloned() else {
                    drop(state);
                    session.report(Diagnostic::new(
                        Severity::Warning,
                        "there is no transaction in progress",
                    ));
                    return Ok(());
                };
                state.tables = block.snapshot;
                state.end_transaction();
                Ok(())
            }
            TransactionStmt::Savepoint(name) => state.define_savepoint(name),
            TransactionStmt::Release(name) => state.release_savepoint(name),
            TransactionStmt::RollbackTo(name) => state.rollback_to_savepoint(name),
            TransactionStmt::Prepare(gid) => {
                let Some(block) = state.block().cloned() else {
                    drop(state);
                    session.report(Diagnostic::new(
                        Severity::Warning,
                        "there is no transaction in progress",
                    ));
                    return Ok(());
                };
                if state.prepared.contains_key(gid) {
                    return Err(RollbackError::statement(format!(
                        "transaction identifier \"{}\" is already in use",
                        gid
                    )));
                }
                if block.aborted {
                    state.tables = block.snapshot.clone();
                }
                state.prepared.insert(gid.clone(), block.snapshot);
                state.end_transaction();
                Ok(())
            }
            TransactionStmt::CommitPrepared(gid) | TransactionStmt::RollbackPrepared(gid) => {
                if state.block().is_some() {
                    return Err(RollbackError::statement(format!(
                        "{} cannot run inside a transaction block",
                        stmt.tag()
                    )));
                }
                let snapshot = state.prepared.remove(gid).ok_or_else(|| {
                    RollbackError::statement(format!(
                        "prepared transaction with identifier \"{}\" does not exist",
                        gid
                    ))
                })?;
                if matches!(stmt, TransactionStmt::RollbackPrepared(_)) {
                    state.tables = snapshot;
                }
                Ok(())
            }
        }
    }

    fn declare_cursor(
        &self,
        session: &Session<MemoryHost>,
        name: &str,
        query: &MemoryQuery,
    ) -> RollbackResult<()> {
        {
            let mut state = self.state_mut();
            state.block_mut("DECLARE CURSOR")?;
            if state.cursors.contains_key(name) {
                return Err(RollbackError::statement(format!(
                    "cursor \"{}\" already exists",
                    name
                )));
            }
        }

        let plan = session.plan(query)?;
        let mut desc = MemoryQueryDesc::new(plan);
        session.executor_start(&mut desc)?;
        let scope = desc.acquired_in.unwrap_or(SESSION_SCOPE);
        self.state_mut()
            .cursors
            .insert(name.to_string(), Cursor { desc, scope });
        Ok(())
    }

    fn take_cursor(&self, name: &str) -> RollbackResult<Cursor> {
        self.state_mut()
            .cursors
            .remove(name)
            .ok_or_else(|| RollbackError::statement(format!("cursor \"{}\" does not exist", name)))
    }

    /// Run `stage` on a cursor with the cursor's own scope active
    fn with_cursor_scope<T>(
        &self,
        cursor: &mut Cursor,
        stage: impl FnOnce(&mut MemoryQueryDesc) -> RollbackResult<T>,
    ) -> RollbackResult<T> {
        let previous = self.active_scope();
        self.set_active_scope(cursor.scope);
        let result = stage(&mut cursor.desc);
        self.set_active_scope(previous);
        result
    }

    fn fetch(&self, session: &Session<MemoryHost>, name: &str) -> RollbackResult<()> {
        let mut cursor = self.take_cursor(name)?;
        let result = self.with_cursor_scope(&mut cursor, |desc| session.executor_run(desc));
        let rows = cursor.desc.rows.clone();
        self.state_mut().cursors.insert(name.to_string(), cursor);
        result?;
        self.set_last_rows(rows);
        Ok(())
    }

    fn close(&self, session: &Session<MemoryHost>, name: &str) -> RollbackResult<()> {
        let mut cursor = self.take_cursor(name)?;
        self.with_cursor_scope(&mut cursor, |desc| {
            session.executor_finish(desc)?;
            session.executor_end(desc)
        })
    }
}

/// Plan and execute one query through the session's pipeline
pub(crate) fn run_query(
    session: &Session<MemoryHost>,
    query: &MemoryQuery,
) -> RollbackResult<Vec<i64>> {
    let plan = session.plan(query)?;
    let mut desc = MemoryQueryDesc::new(plan);
    session.executor_start(&mut desc)?;
    session.executor_run(&mut desc)?;
    session.executor_finish(&mut desc)?;
    session.executor_end(&mut desc)?;
    Ok(desc.rows)
}

impl Host for MemoryHost {
    type Query = MemoryQuery;
    type Plan = MemoryPlan;
    type QueryDesc = MemoryQueryDesc;
    type Utility = MemoryUtility;

    fn standard_planner(
        &self,
        session: &Session<Self>,
        query: &MemoryQuery,
    ) -> RollbackResult<MemoryPlan> {
        self.plan_query(session, query)
    }

    fn standard_process_utility(
        &self,
        session: &Session<Self>,
        statement: &MemoryUtility,
        origin: CallOrigin,
    ) -> RollbackResult<()> {
        match statement {
            MemoryUtility::Transaction(stmt) if origin.is_internal() => {
                Err(RollbackError::statement(format!(
                    "unsupported transaction command {} in a function body",
                    stmt.tag()
                )))
            }
            MemoryUtility::Transaction(stmt) => self.process_transaction(session, stmt),
            MemoryUtility::CreateTable { name } => {
                let mut state = self.state_mut();
                if state.tables.contains_key(name) {
                    return Err(RollbackError::statement(format!(
                        "relation \"{}\" already exists",
                        name
                    )));
                }
                state.tables.insert(name.clone(), Vec::new());
                Ok(())
            }
            MemoryUtility::DropTable { name } => {
                self.state_mut().tables.remove(name).map(|_| ()).ok_or_else(|| {
                    RollbackError::statement(format!("table \"{}\" does not exist", name))
                })
            }
            MemoryUtility::DeclareCursor { name, query } => {
                self.declare_cursor(session, name, query)
            }
            MemoryUtility::Fetch { name } => self.fetch(session, name),
            MemoryUtility::Close { name } => self.close(session, name),
        }
    }

    fn standard_executor_start(
        &self,
        _session: &Session<Self>,
        desc: &mut MemoryQueryDesc,
    ) -> RollbackResult<()> {
        desc.acquired_in = Some(self.active_scope());
        Ok(())
    }

    fn standard_executor_run(
        &self,
        session: &Session<Self>,
        desc: &mut MemoryQueryDesc,
    ) -> RollbackResult<()> {
        desc.rows = self.run_plan(session, &desc.plan)?;
        Ok(())
    }

    fn standard_executor_finish(
        &self,
        _session: &Session<Self>,
        _desc: &mut MemoryQueryDesc,
    ) -> RollbackResult<()> {
        Ok(())
    }

    fn standard_executor_end(
        &self,
        _session: &Session<Self>,
        desc: &mut MemoryQueryDesc,
    ) -> RollbackResult<()> {
        let active = self.active_scope();
        match desc.acquired_in.take() {
            Some(scope) if scope != active => Err(RollbackError::internal(format!(
                "executor resources acquired in {} released in {}",
                scope, active
            ))),
            _ => Ok(()),
        }
    }

    fn define_checkpoint(&self, name: &str) -> RollbackResult<()> {
        self.state_mut().define_savepoint(name)
    }

    fn release_checkpoint(&self, name: &str) -> RollbackResult<()> {
        self.state_mut().release_savepoint(name)
    }

    fn finalize_unit_of_work(&self) -> RollbackResult<()> {
        let mut state = self.state_mut();
        state.command_counter += 1;
        if let Some(txn) = state.txn.as_mut() {
            if txn.state == BlockState::Begun {
                txn.state = BlockState::InProgress;
            }
        }
        Ok(())
    }

    fn active_scope(&self) -> ScopeId {
        self.state().active_scope()
    }

    fn set_active_scope(&self, scope: ScopeId) {
        self.state_mut().active_scope = Some(scope);
    }

    fn statement_memory(&self) -> Option<MemoryId> {
        self.state().portals.last().map(|portal| portal.memory)
    }

    fn register_teardown(
        &self,
        memory: MemoryId,
        callback: TeardownCallback<Self>,
    ) -> RollbackResult<()> {
        let mut state = self.state_mut();
        let portal = state
            .portals
            .iter_mut()
            .find(|portal| portal.memory == memory)
            .ok_or_else(|| RollbackError::internal(format!("unknown statement memory {}", memory)))?;
        portal.callbacks.push(callback);
        Ok(())
    }

    fn in_parallel_worker(&self) -> bool {
        self.parallel_worker.get()
    }

    fn log_settings(&self) -> LogSettings {
        self.log_settings.get()
    }

    fn emit_diagnostic(&self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error | Severity::Fatal | Severity::Panic => log::debug!("{}", diagnostic),
            _ => log::trace!("{}", diagnostic),
        }
        self.state_mut().diagnostics.push(diagnostic.clone());
    }
}
