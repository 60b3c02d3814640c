// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Stale intent suppression on statement faults

use crate::host::{Diagnostic, Host};
use crate::session::Session;

use super::hook::{DiagnosticHook, DiagnosticNext};

/// Drops checkpoint intents left behind by a failing statement.
///
/// A statement that fails after a nested write set the deferred-restore mark,
/// or after its top-level execution saved the active scope, never reaches the
/// point where those are consumed. Both are cleared when the error is
/// reported, so the next statement starts clean.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultSuppressor;

impl FaultSuppressor {
    pub fn new() -> Self {
        FaultSuppressor
    }
}

impl<H: Host> DiagnosticHook<H> for FaultSuppressor {
    fn name(&self) -> &'static str {
        "fault_suppressor"
    }

    fn emit(&self, session: &Session<H>, diagnostic: &mut Diagnostic, next: DiagnosticNext<'_, H>) {
        if diagnostic.aborts_statement() {
            if session.deferred().take() {
                log::debug!("statement failed, dropping deferred release and add savepoint");
            }
            if session.nesting().is_top_level() {
                session.checkpoints().discard_saved_scope();
            }
        }
        next.emit(diagnostic)
    }
}
