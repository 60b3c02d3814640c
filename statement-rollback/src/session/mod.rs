// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session state for automatic statement rollback
//!
//! All state lives in one [`Session`] value per client connection:
//! - nesting counters of the planner and executor stages
//! - transaction-open and checkpoint-pending flags
//! - the ownership-scope handoff slots
//! - the deferred-restore flag
//!
//! Nothing is shared between sessions.

pub mod context;
pub mod deferred;
pub mod nesting;
pub mod transaction_state;

pub use context::{Session, SessionBuilder};
pub use deferred::DeferredRestore;
pub use nesting::{ExecutorGuard, NestingSnapshot, NestingTracker, PlannerGuard};
pub use transaction_state::{TransactionPhase, TransactionState};
