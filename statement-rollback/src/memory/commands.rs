// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statements understood by the in-memory engine

use crate::host::{
    AclMode, CommandType, PlanInfo, RangeEntryKind, RangeTableEntry, ScopeId, TransactionStmt,
    UtilityInfo, UtilityKind,
};

/// A client statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query(MemoryQuery),
    Utility(MemoryUtility),
}

/// Planned statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryQuery {
    /// Read every row of the listed tables
    Select { tables: Vec<String> },
    /// SELECT ... FOR UPDATE
    SelectForUpdate { table: String },
    Insert { table: String, values: Vec<i64> },
    /// Add `delta` to every row
    Update { table: String, delta: i64 },
    Delete { table: String },
    /// SELECT f()
    CallFunction(Function),
    /// Read through a view; the view query is planned as a sub-plan
    View { name: String, query: Box<MemoryQuery> },
    /// Raise a statement fault while planning or running
    Fail { message: String, stage: FailStage },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailStage {
    Plan,
    Run,
}

/// A server-side function whose body runs nested inside the calling
/// statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub body: Vec<Command>,
    /// Immutable functions are folded by the planner: the body runs while
    /// the calling statement is being planned
    pub plan_time: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, body: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            body,
            plan_time: false,
        }
    }

    pub fn at_plan_time(mut self) -> Self {
        self.plan_time = true;
        self
    }
}

/// Utility statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryUtility {
    Transaction(TransactionStmt),
    CreateTable { name: String },
    DropTable { name: String },
    DeclareCursor { name: String, query: MemoryQuery },
    Fetch { name: String },
    Close { name: String },
}

impl UtilityInfo for MemoryUtility {
    fn kind(&self) -> UtilityKind<'_> {
        match self {
            MemoryUtility::Transaction(stmt) => UtilityKind::Transaction(stmt),
            MemoryUtility::CreateTable { .. } => UtilityKind::Other {
                tag: "CREATE TABLE",
            },
            MemoryUtility::DropTable { .. } => UtilityKind::Other { tag: "DROP TABLE" },
            MemoryUtility::DeclareCursor { .. } => UtilityKind::DeclareCursor,
            MemoryUtility::Fetch { .. } => UtilityKind::Fetch,
            MemoryUtility::Close { .. } => UtilityKind::ClosePortal,
        }
    }
}

impl MemoryQuery {
    pub fn select<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryQuery::Select {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn select_for_update(table: impl Into<String>) -> Self {
        MemoryQuery::SelectForUpdate {
            table: table.into(),
        }
    }

    pub fn insert(table: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        MemoryQuery::Insert {
            table: table.into(),
            values: values.into_iter().collect(),
        }
    }

    pub fn update(table: impl Into<String>, delta: i64) -> Self {
        MemoryQuery::Update {
            table: table.into(),
            delta,
        }
    }

    pub fn delete(table: impl Into<String>) -> Self {
        MemoryQuery::Delete {
            table: table.into(),
        }
    }

    pub fn call(function: Function) -> Self {
        MemoryQuery::CallFunction(function)
    }

    pub fn view(name: impl Into<String>, query: MemoryQuery) -> Self {
        MemoryQuery::View {
            name: name.into(),
            query: Box::new(query),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MemoryQuery::Fail {
            message: message.into(),
            stage: FailStage::Run,
        }
    }

    pub fn fail_at_plan(message: impl Into<String>) -> Self {
        MemoryQuery::Fail {
            message: message.into(),
            stage: FailStage::Plan,
        }
    }

    pub fn command_type(&self) -> CommandType {
        match self {
            MemoryQuery::Insert { .. } => CommandType::Insert,
            MemoryQuery::Update { .. } => CommandType::Update,
            MemoryQuery::Delete { .. } => CommandType::Delete,
            MemoryQuery::Select { .. }
            | MemoryQuery::SelectForUpdate { .. }
            | MemoryQuery::CallFunction(_)
            | MemoryQuery::View { .. }
            | MemoryQuery::Fail { .. } => CommandType::Select,
        }
    }

    /// Range table of this query alone, sub-plans excluded
    pub(crate) fn own_range_table(&self) -> Vec<RangeTableEntry> {
        match self {
            MemoryQuery::Select { tables } => tables
                .iter()
                .map(|table| RangeTableEntry::relation(table.as_str(), AclMode::SELECT))
                .collect(),
            MemoryQuery::SelectForUpdate { table } => vec![RangeTableEntry::relation(
                table.as_str(),
                AclMode::SELECT | AclMode::UPDATE,
            )],
            MemoryQuery::Insert { table, .. } => {
                vec![RangeTableEntry::relation(table.as_str(), AclMode::INSERT)]
            }
            MemoryQuery::Update { table, .. } => vec![RangeTableEntry::relation(
                table.as_str(),
                AclMode::SELECT | AclMode::UPDATE,
            )],
            MemoryQuery::Delete { table } => vec![RangeTableEntry::relation(
                table.as_str(),
                AclMode::SELECT | AclMode::DELETE,
            )],
            MemoryQuery::CallFunction(_) => vec![RangeTableEntry::other(RangeEntryKind::Function)],
            MemoryQuery::View { .. } => vec![RangeTableEntry::other(RangeEntryKind::Subquery)],
            MemoryQuery::Fail { .. } => vec![RangeTableEntry::other(RangeEntryKind::Result)],
        }
    }
}

impl Command {
    pub fn query(query: MemoryQuery) -> Self {
        Command::Query(query)
    }

    pub fn select<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::Query(MemoryQuery::select(tables))
    }

    pub fn select_for_update(table: impl Into<String>) -> Self {
        Command::Query(MemoryQuery::select_for_update(table))
    }

    pub fn insert(table: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Command::Query(MemoryQuery::insert(table, values))
    }

    pub fn update(table: impl Into<String>, delta: i64) -> Self {
        Command::Query(MemoryQuery::update(table, delta))
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Command::Query(MemoryQuery::delete(table))
    }

    pub fn call(function: Function) -> Self {
        Command::Query(MemoryQuery::call(function))
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Command::Query(MemoryQuery::fail(message))
    }

    pub fn fail_at_plan(message: impl Into<String>) -> Self {
        Command::Query(MemoryQuery::fail_at_plan(message))
    }

    pub fn create_table(name: impl Into<String>) -> Self {
        Command::Utility(MemoryUtility::CreateTable { name: name.into() })
    }

    pub fn drop_table(name: impl Into<String>) -> Self {
        Command::Utility(MemoryUtility::DropTable { name: name.into() })
    }

    pub fn declare_cursor(name: impl Into<String>, query: MemoryQuery) -> Self {
        Command::Utility(MemoryUtility::DeclareCursor {
            name: name.into(),
            query,
        })
    }

    pub fn fetch(name: impl Into<String>) -> Self {
        Command::Utility(MemoryUtility::Fetch { name: name.into() })
    }

    pub fn close(name: impl Into<String>) -> Self {
        Command::Utility(MemoryUtility::Close { name: name.into() })
    }

    pub fn transaction(stmt: TransactionStmt) -> Self {
        Command::Utility(MemoryUtility::Transaction(stmt))
    }

    pub fn begin() -> Self {
        Self::transaction(TransactionStmt::Begin)
    }

    pub fn start_transaction() -> Self {
        Self::transaction(TransactionStmt::Start)
    }

    pub fn commit() -> Self {
        Self::transaction(TransactionStmt::Commit)
    }

    pub fn rollback() -> Self {
        Self::transaction(TransactionStmt::Rollback)
    }

    pub fn savepoint(name: impl Into<String>) -> Self {
        Self::transaction(TransactionStmt::Savepoint(name.into()))
    }

    pub fn release(name: impl Into<String>) -> Self {
        Self::transaction(TransactionStmt::Release(name.into()))
    }

    pub fn rollback_to(name: impl Into<String>) -> Self {
        Self::transaction(TransactionStmt::RollbackTo(name.into()))
    }

    pub fn prepare(gid: impl Into<String>) -> Self {
        Self::transaction(TransactionStmt::Prepare(gid.into()))
    }

    pub fn commit_prepared(gid: impl Into<String>) -> Self {
        Self::transaction(TransactionStmt::CommitPrepared(gid.into()))
    }

    pub fn rollback_prepared(gid: impl Into<String>) -> Self {
        Self::transaction(TransactionStmt::RollbackPrepared(gid.into()))
    }

    /// Statements still accepted inside an aborted transaction block
    pub fn allowed_in_aborted_block(&self) -> bool {
        matches!(
            self,
            Command::Utility(MemoryUtility::Transaction(
                TransactionStmt::Rollback
                    | TransactionStmt::RollbackTo(_)
                    | TransactionStmt::Commit
            ))
        )
    }
}

/// Planner output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPlan {
    pub query: MemoryQuery,
    pub command: CommandType,
    pub range_table: Vec<RangeTableEntry>,
    pub subplans: Vec<MemoryPlan>,
}

impl PlanInfo for MemoryPlan {
    fn command(&self) -> CommandType {
        self.command
    }

    fn range_table(&self) -> &[RangeTableEntry] {
        &self.range_table
    }
}

/// Executor state of one planned statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryQueryDesc {
    pub plan: MemoryPlan,
    /// Ownership scope the executor resources were acquired under
    pub acquired_in: Option<ScopeId>,
    /// Rows produced by the last run
    pub rows: Vec<i64>,
}

impl MemoryQueryDesc {
    pub fn new(plan: MemoryPlan) -> Self {
        Self {
            plan,
            acquired_in: None,
            rows: Vec::new(),
        }
    }
}

impl PlanInfo for MemoryQueryDesc {
    fn command(&self) -> CommandType {
        self.plan.command
    }

    fn range_table(&self) -> &[RangeTableEntry] {
        &self.plan.range_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::is_write;

    #[test]
    fn test_utility_kinds() {
        assert_eq!(
            MemoryUtility::CreateTable { name: "t".into() }.kind(),
            UtilityKind::Other {
                tag: "CREATE TABLE"
            }
        );
        assert_eq!(
            MemoryUtility::Fetch { name: "c".into() }.kind(),
            UtilityKind::Fetch
        );
        let begin = MemoryUtility::Transaction(TransactionStmt::Begin);
        assert_eq!(
            begin.kind(),
            UtilityKind::Transaction(&TransactionStmt::Begin)
        );
    }

    #[test]
    fn test_aborted_block_whitelist() {
        assert!(Command::rollback().allowed_in_aborted_block());
        assert!(Command::rollback_to("sp").allowed_in_aborted_block());
        assert!(Command::commit().allowed_in_aborted_block());
        assert!(!Command::insert("t", [1]).allowed_in_aborted_block());
        assert!(!Command::savepoint("sp").allowed_in_aborted_block());
    }

    #[test]
    fn test_own_range_tables_drive_write_detection() {
        let plan = |query: MemoryQuery| MemoryPlan {
            command: query.command_type(),
            range_table: query.own_range_table(),
            query,
            subplans: Vec::new(),
        };
        assert!(!is_write(&plan(MemoryQuery::select(["a", "b"]))));
        assert!(is_write(&plan(MemoryQuery::insert("a", [1]))));
        assert!(is_write(&plan(MemoryQuery::select_for_update("a"))));
        assert!(!is_write(&plan(MemoryQuery::call(Function::new(
            "f",
            vec![Command::insert("a", [1])]
        )))));
    }
}
