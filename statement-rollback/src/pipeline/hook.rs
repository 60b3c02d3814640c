// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Hook chain plumbing
//!
//! A hook receives the stage arguments plus a [`Next`] continuation. Calling
//! the continuation runs the rest of the chain and finally the host's
//! standard implementation. A hook that does not override a stage forwards
//! it untouched.

use crate::error::RollbackResult;
use crate::host::{CallOrigin, Diagnostic, Host};
use crate::session::Session;

/// Interceptor around the planner and executor stages
pub trait PipelineHook<H: Host> {
    fn name(&self) -> &'static str;

    fn plan(
        &self,
        _session: &Session<H>,
        query: &H::Query,
        next: Next<'_, H>,
    ) -> RollbackResult<H::Plan> {
        next.plan(query)
    }

    fn process_utility(
        &self,
        _session: &Session<H>,
        statement: &H::Utility,
        origin: CallOrigin,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        next.process_utility(statement, origin)
    }

    fn executor_start(
        &self,
        _session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        next.executor_start(desc)
    }

    fn executor_run(
        &self,
        _session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        next.executor_run(desc)
    }

    fn executor_finish(
        &self,
        _session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        next.executor_finish(desc)
    }

    fn executor_end(
        &self,
        _session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        next.executor_end(desc)
    }
}

/// The remainder of the pipeline hook chain
pub struct Next<'a, H: Host> {
    session: &'a Session<H>,
    position: usize,
}

impl<'a, H: Host> Next<'a, H> {
    /// The whole chain, starting at the outermost hook
    pub(crate) fn new(session: &'a Session<H>) -> Self {
        Self {
            session,
            position: 0,
        }
    }

    fn split(&self) -> (Option<&'a dyn PipelineHook<H>>, Next<'a, H>) {
        let hook = self.session.hooks.get(self.position).map(|hook| hook.as_ref());
        let rest = Next {
            session: self.session,
            position: self.position + 1,
        };
        (hook, rest)
    }

    pub fn plan(self, query: &H::Query) -> RollbackResult<H::Plan> {
        let session = self.session;
        match self.split() {
            (Some(hook), rest) => hook.plan(session, query, rest),
            (None, _) => session.host().standard_planner(session, query),
        }
    }

    pub fn process_utility(self, statement: &H::Utility, origin: CallOrigin) -> RollbackResult<()> {
        let session = self.session;
        match self.split() {
            (Some(hook), rest) => hook.process_utility(session, statement, origin, rest),
            (None, _) => session
                .host()
                .standard_process_utility(session, statement, origin),
        }
    }

    pub fn executor_start(self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        let session = self.session;
        match self.split() {
            (Some(hook), rest) => hook.executor_start(session, desc, rest),
            (None, _) => session.host().standard_executor_start(session, desc),
        }
    }

    pub fn executor_run(self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        let session = self.session;
        match self.split() {
            (Some(hook), rest) => hook.executor_run(session, desc, rest),
            (None, _) => session.host().standard_executor_run(session, desc),
        }
    }

    pub fn executor_finish(self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        let session = self.session;
        match self.split() {
            (Some(hook), rest) => hook.executor_finish(session, desc, rest),
            (None, _) => session.host().standard_executor_finish(session, desc),
        }
    }

    pub fn executor_end(self, desc: &mut H::QueryDesc) -> RollbackResult<()> {
        let session = self.session;
        match self.split() {
            (Some(hook), rest) => hook.executor_end(session, desc, rest),
            (None, _) => session.host().standard_executor_end(session, desc),
        }
    }
}

/// Observer on the diagnostic channel
pub trait DiagnosticHook<H: Host> {
    fn name(&self) -> &'static str;

    fn emit(&self, _session: &Session<H>, diagnostic: &mut Diagnostic, next: DiagnosticNext<'_, H>) {
        next.emit(diagnostic)
    }
}

/// The remainder of the diagnostic hook chain
pub struct DiagnosticNext<'a, H: Host> {
    session: &'a Session<H>,
    position: usize,
}

impl<'a, H: Host> DiagnosticNext<'a, H> {
    pub(crate) fn new(session: &'a Session<H>) -> Self {
        Self {
            session,
            position: 0,
        }
    }

    pub fn emit(self, diagnostic: &mut Diagnostic) {
        let session = self.session;
        match session.diagnostic_hooks.get(self.position) {
            Some(hook) => {
                let rest = DiagnosticNext {
                    session,
                    position: self.position + 1,
                };
                hook.emit(session, diagnostic, rest)
            }
            None => session.host().emit_diagnostic(diagnostic),
        }
    }
}
