// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-session context passed through every pipeline stage

use crate::checkpoint::{CheckpointManager, ScopeHandoff};
use crate::config::RollbackConfig;
use crate::error::RollbackResult;
use crate::host::{CallOrigin, Diagnostic, Host};
use crate::pipeline::{
    DiagnosticHook, DiagnosticNext, FaultSuppressor, Next, PipelineHook, StatementRollback,
};

use super::deferred::DeferredRestore;
use super::nesting::NestingTracker;
use super::transaction_state::{TransactionPhase, TransactionState};

/// One client session: the host, the composed hook chains and all
/// rollback bookkeeping.
///
/// Every stage entry point (`plan`, `process_utility`, `executor_*`)
/// traverses the hook chain from the outermost hook to the host's standard
/// implementation. Hosts call the same entry points for nested statements.
pub struct Session<H: Host> {
    host: H,
    config: RollbackConfig,
    pub(crate) hooks: Vec<Box<dyn PipelineHook<H>>>,
    pub(crate) diagnostic_hooks: Vec<Box<dyn DiagnosticHook<H>>>,
    nesting: NestingTracker,
    transaction: TransactionState,
    handoff: ScopeHandoff,
    deferred: DeferredRestore,
}

impl<H: Host> Session<H> {
    /// Start composing a session around a host
    pub fn builder(host: H) -> SessionBuilder<H> {
        SessionBuilder::new(host)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    pub fn nesting(&self) -> &NestingTracker {
        &self.nesting
    }

    pub fn transaction(&self) -> &TransactionState {
        &self.transaction
    }

    pub fn handoff(&self) -> &ScopeHandoff {
        &self.handoff
    }

    pub fn deferred(&self) -> &DeferredRestore {
        &self.deferred
    }

    pub fn phase(&self) -> TransactionPhase {
        self.transaction.phase()
    }

    /// Checkpoint operations bound to this session
    pub fn checkpoints(&self) -> CheckpointManager<'_, H> {
        CheckpointManager::new(self)
    }

    /// Names of the installed pipeline hooks, outermost first
    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    // Stage entry points

    pub fn plan(&self, query: &H::Query) -> RollbackResult<H::Plan> {
        Next::new(self).plan(query)
    }

    pub fn process_utility(&self, statement: &H::Utility, origin: CallOrigin) -> RollbackResult<()> {
        Next::new(self).process_utility(statement, origin)
    }

    pub fn executor_start(&self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        Next::new(self).executor_start(desc)
    }

    pub fn executor_run(&self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        Next::new(self).executor_run(desc)
    }

    pub fn executor_finish(&self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        Next::new(self).executor_finish(desc)
    }

    pub fn executor_end(&self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        Next::new(self).executor_end(desc)
    }

    /// Send a diagnostic down the diagnostic hook chain to the host
    pub fn report(&self, diagnostic: Diagnostic) {
        let mut diagnostic = diagnostic;
        DiagnosticNext::new(self).emit(&mut diagnostic);
    }
}

/// Composes a [`Session`]: configuration plus ordered hook lists.
///
/// Hooks run in the order they were added, the first one outermost.
pub struct SessionBuilder<H: Host> {
    host: H,
    config: RollbackConfig,
    hooks: Vec<Box<dyn PipelineHook<H>>>,
    diagnostic_hooks: Vec<Box<dyn DiagnosticHook<H>>>,
}

impl<H: Host> SessionBuilder<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            config: RollbackConfig::default(),
            hooks: Vec::new(),
            diagnostic_hooks: Vec::new(),
        }
    }

    pub fn config(mut self, config: RollbackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hook(mut self, hook: impl PipelineHook<H> + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn diagnostic_hook(mut self, hook: impl DiagnosticHook<H> + 'static) -> Self {
        self.diagnostic_hooks.push(Box::new(hook));
        self
    }

    /// Install the statement rollback interceptor and its fault suppressor
    pub fn with_statement_rollback(self) -> Self {
        self.hook(StatementRollback::new())
            .diagnostic_hook(FaultSuppressor::new())
    }

    /// Build the session, validating the configuration first
    pub fn try_build(self) -> RollbackResult<Session<H>> {
        self.config.validate()?;
        Ok(self.build())
    }

    pub fn build(self) -> Session<H> {
        log::debug!(
            "building session: {} pipeline hook(s), {} diagnostic hook(s), checkpoint \"{}\" (enabled {}, write only {})",
            self.hooks.len(),
            self.diagnostic_hooks.len(),
            self.config.checkpoint_name,
            self.config.enabled,
            self.config.write_only
        );
        Session {
            host: self.host,
            config: self.config,
            hooks: self.hooks,
            diagnostic_hooks: self.diagnostic_hooks,
            nesting: NestingTracker::new(),
            transaction: TransactionState::new(),
            handoff: ScopeHandoff::new(),
            deferred: DeferredRestore::new(),
        }
    }
}
