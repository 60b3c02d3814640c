// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine-facing data types consumed by the rollback layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Handle to an ownership scope (the unit the engine uses to attribute
/// locks, cache references and temporary allocations for cleanup)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    pub const fn new(raw: u64) -> Self {
        ScopeId(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Handle to the working memory of one top-level statement. Teardown
/// callbacks registered on it run when the statement concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryId(u64);

impl MemoryId {
    pub const fn new(raw: u64) -> Self {
        MemoryId(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory#{}", self.0)
    }
}

/// Diagnostic severities, ordered like the engine's message levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    Log,
    Info,
    Notice,
    Warning,
    /// Aborts the current statement
    Error,
    /// Terminates the session
    Fatal,
    Panic,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Log => "LOG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Panic => "PANIC",
        }
    }
}

/// A message travelling on the engine's diagnostic channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Do not append the current statement text when the host prints it
    pub hide_statement: bool,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            hide_statement: false,
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        Self::new(Severity::Log, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn hide_statement(mut self) -> Self {
        self.hide_statement = true;
        self
    }

    /// True when the diagnostic means the current statement is aborted
    pub fn aborts_statement(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:  {}", self.severity.as_str(), self.message)
    }
}

/// Table privileges a statement requires, as a bit mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AclMode(u32);

impl AclMode {
    pub const NONE: AclMode = AclMode(0);
    pub const INSERT: AclMode = AclMode(1 << 0);
    pub const SELECT: AclMode = AclMode(1 << 1);
    pub const UPDATE: AclMode = AclMode(1 << 2);
    pub const DELETE: AclMode = AclMode(1 << 3);
    pub const TRUNCATE: AclMode = AclMode(1 << 4);
    pub const REFERENCES: AclMode = AclMode(1 << 5);
    pub const TRIGGER: AclMode = AclMode(1 << 6);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: AclMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when anything beyond read access is required
    pub fn beyond_select(&self) -> bool {
        self.0 & !AclMode::SELECT.0 != 0
    }
}

impl BitOr for AclMode {
    type Output = AclMode;

    fn bitor(self, rhs: AclMode) -> AclMode {
        AclMode(self.0 | rhs.0)
    }
}

/// What a range-table entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeEntryKind {
    /// A real table
    Relation,
    Subquery,
    Join,
    Function,
    TableFunction,
    Values,
    Cte,
    NamedTuplestore,
    Result,
}

/// One entry of a planned statement's range table with its resolved
/// permission requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeTableEntry {
    pub kind: RangeEntryKind,
    pub relation: Option<String>,
    pub required_permissions: AclMode,
}

impl RangeTableEntry {
    pub fn relation(name: impl Into<String>, required_permissions: AclMode) -> Self {
        Self {
            kind: RangeEntryKind::Relation,
            relation: Some(name.into()),
            required_permissions,
        }
    }

    pub fn other(kind: RangeEntryKind) -> Self {
        Self {
            kind,
            relation: None,
            required_permissions: AclMode::NONE,
        }
    }
}

/// Kind of planned command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Utility,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Select => "SELECT",
            CommandType::Insert => "INSERT",
            CommandType::Update => "UPDATE",
            CommandType::Delete => "DELETE",
            CommandType::Merge => "MERGE",
            CommandType::Utility => "UTILITY",
        }
    }
}

/// Transaction control statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStmt {
    Begin,
    Start,
    Commit,
    Rollback,
    Savepoint(String),
    Release(String),
    RollbackTo(String),
    /// PREPARE TRANSACTION 'gid'
    Prepare(String),
    CommitPrepared(String),
    RollbackPrepared(String),
}

impl TransactionStmt {
    pub fn tag(&self) -> &'static str {
        match self {
            TransactionStmt::Begin => "BEGIN",
            TransactionStmt::Start => "START TRANSACTION",
            TransactionStmt::Commit => "COMMIT",
            TransactionStmt::Rollback => "ROLLBACK",
            TransactionStmt::Savepoint(_) => "SAVEPOINT",
            TransactionStmt::Release(_) => "RELEASE",
            TransactionStmt::RollbackTo(_) => "ROLLBACK",
            TransactionStmt::Prepare(_) => "PREPARE TRANSACTION",
            TransactionStmt::CommitPrepared(_) => "COMMIT PREPARED",
            TransactionStmt::RollbackPrepared(_) => "ROLLBACK PREPARED",
        }
    }
}

/// The shape of a utility statement, as far as checkpoint handling cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityKind<'a> {
    Transaction(&'a TransactionStmt),
    /// DECLARE CURSOR: the plan is produced later, when the cursor runs
    DeclareCursor,
    Fetch,
    ClosePortal,
    /// Any other utility or DDL statement
    Other { tag: &'a str },
}

/// Who issued a utility statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallOrigin {
    /// Sent by the client as a top-level statement
    Client,
    /// Issued by server-side code (function bodies, triggers)
    Internal,
}

impl CallOrigin {
    pub fn is_internal(&self) -> bool {
        matches!(self, CallOrigin::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_beyond_select() {
        assert!(!AclMode::SELECT.beyond_select());
        assert!(!AclMode::NONE.beyond_select());
        assert!((AclMode::SELECT | AclMode::UPDATE).beyond_select());
        assert!(AclMode::INSERT.beyond_select());
        assert!((AclMode::SELECT | AclMode::DELETE).contains(AclMode::DELETE));
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Diagnostic::error("boom").aborts_statement());
        assert!(Diagnostic::new(Severity::Fatal, "bye").aborts_statement());
        assert!(!Diagnostic::log("statement: BEGIN").aborts_statement());
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("relation \"t\" does not exist");
        assert_eq!(diag.to_string(), "ERROR:  relation \"t\" does not exist");
    }
}
