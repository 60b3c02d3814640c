// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types shared by the pipeline, the checkpoint manager and hosts

use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised while a statement travels through the pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RollbackError {
    /// A statement fault raised by the host engine. These are re-raised
    /// unchanged after every nesting guard has unwound.
    #[error("{0}")]
    Statement(String),

    /// A bookkeeping defect in the checkpoint state machine
    #[error("Automatic savepoint internal error, {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RollbackError {
    /// Build a statement fault
    pub fn statement(message: impl Into<String>) -> Self {
        RollbackError::Statement(message.into())
    }

    /// Build an internal fault
    pub fn internal(message: impl Into<String>) -> Self {
        RollbackError::Internal(message.into())
    }

    /// Internal faults are never retried and indicate a broken session
    pub fn is_fatal(&self) -> bool {
        matches!(self, RollbackError::Internal(_))
    }
}

pub type RollbackResult<T> = Result<T, RollbackError>;
