// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ownership-scope handoff slots
//!
//! Defining a checkpoint makes the engine switch to a fresh ownership
//! scope. Work of the statement that is still running must keep being
//! attributed to the scope it started under, so the scope active before the
//! statement is saved, restored right after the checkpoint is defined, and
//! the fresh scope is parked until the statement's memory is torn down.

use crate::error::{RollbackError, RollbackResult};
use crate::host::{MemoryId, ScopeId};
use std::cell::Cell;

/// The scope saved before a checkpoint is defined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedScope {
    pub scope: ScopeId,
    /// Memory of the statement that saved the scope; the teardown callback
    /// adopting the new scope is registered on it
    pub statement_memory: Option<MemoryId>,
}

#[derive(Debug, Default)]
pub struct ScopeHandoff {
    saved: Cell<Option<SavedScope>>,
    pending_new: Cell<Option<ScopeId>>,
}

impl ScopeHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_scope(&self) -> Option<ScopeId> {
        self.saved.get().map(|saved| saved.scope)
    }

    pub fn saved(&self) -> Option<SavedScope> {
        self.saved.get()
    }

    pub fn pending_new_scope(&self) -> Option<ScopeId> {
        self.pending_new.get()
    }

    /// Both slots are empty
    pub fn is_idle(&self) -> bool {
        self.saved.get().is_none() && self.pending_new.get().is_none()
    }

    pub(crate) fn save(&self, saved: SavedScope) -> RollbackResult<()> {
        if let Some(previous) = self.saved.get() {
            return Err(RollbackError::internal(format!(
                "resource owner {} is already saved.",
                previous.scope
            )));
        }
        self.saved.set(Some(saved));
        Ok(())
    }

    pub(crate) fn take_saved(&self) -> Option<SavedScope> {
        self.saved.take()
    }

    pub(crate) fn park_new(&self, scope: ScopeId) -> RollbackResult<()> {
        if let Some(previous) = self.pending_new.get() {
            return Err(RollbackError::internal(format!(
                "resource owner {} is still waiting to be restored.",
                previous
            )));
        }
        self.pending_new.set(Some(scope));
        Ok(())
    }

    pub(crate) fn take_new(&self) -> Option<ScopeId> {
        self.pending_new.take()
    }
}
