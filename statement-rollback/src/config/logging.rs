// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement logging settings read from the host engine

use serde::{Deserialize, Serialize};

/// Which statements the engine writes to its statement log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum LogStatement {
    #[default]
    None,
    Ddl,
    Mod,
    All,
}

impl LogStatement {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatement::None => "none",
            LogStatement::Ddl => "ddl",
            LogStatement::Mod => "mod",
            LogStatement::All => "all",
        }
    }
}

/// Host statement-log settings
///
/// Transaction control statements are only written when
/// `log_statement = all`; durations follow `log_duration` and
/// `log_min_duration_statement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogSettings {
    pub log_statement: LogStatement,
    pub log_duration: bool,
    /// Minimum duration in milliseconds, `None` when disabled
    pub log_min_duration_statement: Option<i64>,
}

impl LogSettings {
    /// Settings logging every statement and its duration
    pub fn verbose() -> Self {
        Self {
            log_statement: LogStatement::All,
            log_duration: true,
            log_min_duration_statement: None,
        }
    }

    pub fn logs_transaction_statements(&self) -> bool {
        self.log_statement >= LogStatement::All
    }

    pub fn logs_durations(&self) -> bool {
        self.log_duration || self.log_min_duration_statement == Some(0)
    }
}
