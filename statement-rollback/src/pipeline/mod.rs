// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pipeline interception
//!
//! Sessions compose an ordered chain of [`PipelineHook`]s around the host's
//! planner and executor stages, and a chain of [`DiagnosticHook`]s in front
//! of the host's diagnostic sink. [`StatementRollback`] and
//! [`FaultSuppressor`] are the two hooks providing automatic statement
//! rollback.

pub mod hook;
pub mod interceptor;
pub mod suppressor;

pub use hook::{DiagnosticHook, DiagnosticNext, Next, PipelineHook};
pub use interceptor::StatementRollback;
pub use suppressor::FaultSuppressor;
