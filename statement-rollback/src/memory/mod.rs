// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory reference engine
//!
//! A small single-session engine implementing [`Host`](crate::host::Host):
//! integer tables, transaction blocks, savepoints with ownership scopes,
//! server-side functions, views and cursors. It drives the rollback layer
//! in tests and benchmarks and shows embedders what a host has to provide.
//!
//! Statements are run with [`Session::execute`](crate::session::Session):
//!
//! ```ignore
//! let session = Session::builder(MemoryHost::new())
//!     .with_statement_rollback()
//!     .build();
//! session.execute(&Command::create_table("t"))?;
//! ```

pub mod commands;
pub mod driver;
pub mod engine;

pub use commands::{
    Command, FailStage, Function, MemoryPlan, MemoryQuery, MemoryQueryDesc, MemoryUtility,
};
pub use engine::{BlockState, MemoryHost, SESSION_SCOPE};
