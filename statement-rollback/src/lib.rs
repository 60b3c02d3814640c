// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement Rollback - statement-level atomicity for transactional engines
//!
//! Most SQL engines abort the whole transaction when one statement fails.
//! This crate layers "autonomous statement rollback" on top of such an
//! engine: inside an open transaction every top-level statement runs under an
//! automatic checkpoint, so a failing statement only loses its own work and
//! the client can roll back to the checkpoint and keep going.
//!
//! # Features
//!
//! - **Checkpoint rotation**: the automatic checkpoint is released and
//!   re-created after every successful top-level statement
//! - **Nesting aware**: statements triggered by functions, views or
//!   plan-time evaluation never move the checkpoint
//! - **Write-only mode**: read-only statements keep the current checkpoint,
//!   nested writes inside a read statement are still detected
//! - **Ownership scope handoff**: the engine's resource-attribution scope
//!   is switched back and forth so no resource is released under the wrong
//!   owner
//! - **In-memory host**: a reference engine (feature `memory`) used by the
//!   test-suite and as a template for embedders
//!
//! # Usage
//!
//! ```ignore
//! use statement_rollback::memory::{Command, MemoryHost};
//! use statement_rollback::{RollbackConfig, Session};
//!
//! let session = Session::builder(MemoryHost::new())
//!     .config(RollbackConfig::default())
//!     .with_statement_rollback()
//!     .build();
//!
//! session.execute(&Command::create_table("t"))?;
//! session.execute(&Command::begin())?;
//! session.execute(&Command::insert("t", [1]))?;
//! assert!(session.execute(&Command::fail("boom")).is_err());
//! session.execute(&Command::rollback_to("PgSLRAutoSvpt"))?;
//! session.execute(&Command::commit())?;
//! ```

// Public modules - exposed to embedders
pub mod checkpoint;
pub mod classify;
pub mod config;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod session;

#[cfg(feature = "memory")]
pub mod memory;

// Re-export the public API
pub use checkpoint::{CheckpointCommand, CheckpointManager, ScopeHandoff};
pub use classify::{classify_utility, is_write, CheckpointIntent};
pub use config::{ConfigError, LogSettings, LogStatement, RollbackConfig};
pub use error::{RollbackError, RollbackResult};
pub use host::{
    AclMode, CallOrigin, CommandType, Diagnostic, Host, MemoryId, PlanInfo, RangeEntryKind,
    RangeTableEntry, ScopeId, Severity, TeardownCallback, TransactionStmt, UtilityInfo,
    UtilityKind,
};
pub use pipeline::{
    DiagnosticHook, DiagnosticNext, FaultSuppressor, Next, PipelineHook, StatementRollback,
};
pub use session::{
    DeferredRestore, NestingSnapshot, NestingTracker, Session, SessionBuilder, TransactionPhase,
    TransactionState,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
