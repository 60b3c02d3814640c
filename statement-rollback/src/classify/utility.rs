// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Utility statement classification
//!
//! Decides, before a client utility statement runs, which checkpoint action
//! follows it. Transaction control statements also update the session's
//! transaction state here.

use crate::config::RollbackConfig;
use crate::host::{TransactionStmt, UtilityKind};
use crate::session::TransactionState;

/// Checkpoint action owed once a utility statement succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckpointIntent {
    #[default]
    None,
    /// Define a checkpoint without releasing the previous one
    Add,
    /// Release the current checkpoint, then define a new one
    ReleaseAndAdd,
}

impl CheckpointIntent {
    pub fn is_none(&self) -> bool {
        matches!(self, CheckpointIntent::None)
    }
}

/// Classify a utility statement issued by the client
pub fn classify_utility(
    kind: UtilityKind<'_>,
    config: &RollbackConfig,
    transaction: &TransactionState,
    executor_depth: u32,
) -> CheckpointIntent {
    let top_level = executor_depth == 0;

    match kind {
        UtilityKind::Transaction(stmt) => {
            classify_transaction(stmt, config, transaction, executor_depth)
        }
        UtilityKind::DeclareCursor if config.enabled && top_level => CheckpointIntent::Add,
        UtilityKind::DeclareCursor | UtilityKind::Fetch | UtilityKind::ClosePortal => {
            CheckpointIntent::None
        }
        UtilityKind::Other { tag } if config.enabled && top_level => {
            log::debug!("utility statement {}, release and add savepoint", tag);
            CheckpointIntent::ReleaseAndAdd
        }
        UtilityKind::Other { .. } => CheckpointIntent::None,
    }
}

fn classify_transaction(
    stmt: &TransactionStmt,
    config: &RollbackConfig,
    transaction: &TransactionState,
    executor_depth: u32,
) -> CheckpointIntent {
    match stmt {
        TransactionStmt::Begin | TransactionStmt::Start => {
            log::debug!(
                "start transaction (executor level {}, transaction opened {})",
                executor_depth,
                transaction.is_open()
            );
            let intent = if config.enabled && executor_depth == 0 && !transaction.is_open() {
                CheckpointIntent::Add
            } else {
                CheckpointIntent::None
            };
            transaction.mark_open();
            intent
        }
        TransactionStmt::Commit
        | TransactionStmt::Rollback
        | TransactionStmt::CommitPrepared(_)
        | TransactionStmt::RollbackPrepared(_) => {
            transaction.mark_closed();
            CheckpointIntent::None
        }
        // The prepared transaction is detached from the session
        TransactionStmt::Prepare(_) => {
            transaction.mark_closed();
            CheckpointIntent::None
        }
        // Stack a checkpoint above the client's one so the client's stays
        // alive when ours is released
        TransactionStmt::Savepoint(name)
            if config.enabled && executor_depth == 0 && *name != config.checkpoint_name =>
        {
            CheckpointIntent::Add
        }
        TransactionStmt::Savepoint(_)
        | TransactionStmt::Release(_)
        | TransactionStmt::RollbackTo(_) => CheckpointIntent::None,
    }
}
