// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Automatic checkpoint management
//!
//! The checkpoint manager defines, releases and rotates the session's
//! automatic checkpoint and performs the ownership-scope handoff that goes
//! with it. `statement_log` renders the lines written to the statement log
//! for those commands.

pub mod handoff;
pub mod manager;
pub mod statement_log;

pub use handoff::{SavedScope, ScopeHandoff};
pub use manager::CheckpointManager;
pub use statement_log::{render_statement_log, CheckpointCommand, PLACEHOLDER_DURATION_MS};
