// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session-scoped transaction state
//!
//! Tracks whether the client has an explicit transaction block open and
//! whether an automatic checkpoint currently exists inside it.

use std::cell::Cell;

/// Where the session stands in the automatic checkpoint lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionPhase {
    /// No explicit transaction block
    Closed,
    /// BEGIN seen, no automatic checkpoint defined yet
    OpenPendingCheckpoint,
    /// An automatic checkpoint exists; rotated after each statement
    OpenWithCheckpoint,
}

/// Transaction state of one session
#[derive(Debug, Default)]
pub struct TransactionState {
    /// An explicit transaction block is open
    open: Cell<bool>,

    /// An automatic checkpoint has been defined and not yet released
    checkpoint_pending: Cell<bool>,
}

impl TransactionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn checkpoint_pending(&self) -> bool {
        self.checkpoint_pending.get()
    }

    pub fn phase(&self) -> TransactionPhase {
        match (self.open.get(), self.checkpoint_pending.get()) {
            (false, _) => TransactionPhase::Closed,
            (true, false) => TransactionPhase::OpenPendingCheckpoint,
            (true, true) => TransactionPhase::OpenWithCheckpoint,
        }
    }

    /// BEGIN / START TRANSACTION
    pub(crate) fn mark_open(&self) {
        log::debug!("mark the transaction as opened");
        self.open.set(true);
    }

    /// COMMIT, ROLLBACK and the two-phase variants. The engine drops every
    /// checkpoint with the transaction.
    pub(crate) fn mark_closed(&self) {
        log::debug!("mark the transaction as closed");
        self.open.set(false);
        self.checkpoint_pending.set(false);
    }

    pub(crate) fn set_checkpoint_pending(&self, pending: bool) {
        self.checkpoint_pending.set(pending);
    }
}
