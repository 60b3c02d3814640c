// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Boundary with the host engine
//!
//! The rollback layer never parses, plans or executes anything itself. It
//! consumes the host through the [`Host`] trait:
//!
//! - the standard implementation of every pipeline stage, called once the
//!   hook chain has been traversed
//! - checkpoint primitives (define, release, finalize the unit of work)
//! - ownership-scope primitives (get and set the active scope)
//! - statement memory and one-shot teardown callbacks
//! - the diagnostic sink and statement-log settings
//!
//! Hosts are single-threaded per session and use interior mutability, so
//! every method takes `&self`. A host must never hold an internal borrow
//! across a call back into the [`Session`], because stages re-enter the
//! pipeline for nested statements.

pub mod types;

pub use types::{
    AclMode, CallOrigin, CommandType, Diagnostic, MemoryId, RangeEntryKind, RangeTableEntry,
    ScopeId, Severity, TransactionStmt, UtilityKind,
};

use crate::config::LogSettings;
use crate::error::RollbackResult;
use crate::session::Session;

/// One-shot callback run when a statement memory is torn down
pub type TeardownCallback<H> = Box<dyn FnOnce(&Session<H>) -> RollbackResult<()>>;

/// Access to the resolved metadata of a planned statement
pub trait PlanInfo {
    fn command(&self) -> CommandType;

    fn range_table(&self) -> &[RangeTableEntry];
}

/// Access to the kind of a utility statement
pub trait UtilityInfo {
    fn kind(&self) -> UtilityKind<'_>;
}

/// A host engine
pub trait Host: Sized + 'static {
    /// Parsed statement handed to the planner
    type Query;
    /// Planner output
    type Plan;
    /// Executor state of one planned statement
    type QueryDesc: PlanInfo;
    /// Utility statement
    type Utility: UtilityInfo;

    // Standard stage implementations. `session` is the entry point for
    // nested statements.

    fn standard_planner(
        &self,
        session: &Session<Self>,
        query: &Self::Query,
    ) -> RollbackResult<Self::Plan>;

    fn standard_process_utility(
        &self,
        session: &Session<Self>,
        statement: &Self::Utility,
        origin: CallOrigin,
    ) -> RollbackResult<()>;

    fn standard_executor_start(
        &self,
        session: &Session<Self>,
        desc: &mut Self::QueryDesc,
    ) -> RollbackResult<()>;

    fn standard_executor_run(
        &self,
        session: &Session<Self>,
        desc: &mut Self::QueryDesc,
    ) -> RollbackResult<()>;

    fn standard_executor_finish(
        &self,
        session: &Session<Self>,
        desc: &mut Self::QueryDesc,
    ) -> RollbackResult<()>;

    fn standard_executor_end(
        &self,
        session: &Session<Self>,
        desc: &mut Self::QueryDesc,
    ) -> RollbackResult<()>;

    // Checkpoint primitives

    /// Define a named checkpoint. Allocates a new active ownership scope.
    fn define_checkpoint(&self, name: &str) -> RollbackResult<()>;

    /// Release the most recent checkpoint with this name, and every
    /// checkpoint defined after it
    fn release_checkpoint(&self, name: &str) -> RollbackResult<()>;

    /// Finalize the preceding unit of work so it is visible to what follows
    fn finalize_unit_of_work(&self) -> RollbackResult<()>;

    // Ownership scopes

    fn active_scope(&self) -> ScopeId;

    fn set_active_scope(&self, scope: ScopeId);

    // Statement memory

    /// Memory of the statement currently being processed, which outlives
    /// every stage of that statement
    fn statement_memory(&self) -> Option<MemoryId>;

    /// Run `callback` exactly once when `memory` is torn down
    fn register_teardown(
        &self,
        memory: MemoryId,
        callback: TeardownCallback<Self>,
    ) -> RollbackResult<()>;

    // Environment

    /// Parallel workers never manage checkpoints
    fn in_parallel_worker(&self) -> bool {
        false
    }

    fn log_settings(&self) -> LogSettings {
        LogSettings::default()
    }

    /// Final sink of the diagnostic channel, after every diagnostic hook
    fn emit_diagnostic(&self, diagnostic: &Diagnostic);
}
