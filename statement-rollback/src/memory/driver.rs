// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Client statement driver for sessions over the in-memory engine

use crate::error::RollbackResult;
use crate::host::{CallOrigin, Diagnostic, Severity};
use crate::session::Session;

use super::commands::Command;
use super::engine::{run_query, MemoryHost};

impl Session<MemoryHost> {
    /// Run one client statement from start to teardown.
    ///
    /// A failing statement is reported on the diagnostic channel, then
    /// aborts the implicit transaction or marks the open block aborted.
    pub fn execute(&self, command: &Command) -> RollbackResult<()> {
        let host = self.host();

        if let Err(err) = host.check_not_aborted(command) {
            self.report(Diagnostic::error(err.to_string()));
            return Err(err);
        }

        let memory = host.begin_statement();
        let result = match command {
            Command::Query(query) => run_query(self, query).map(|rows| host.set_last_rows(rows)),
            Command::Utility(utility) => self.process_utility(utility, CallOrigin::Client),
        };

        if let Err(err) = &result {
            let severity = if err.is_fatal() {
                Severity::Fatal
            } else {
                Severity::Error
            };
            self.report(Diagnostic::new(severity, err.to_string()));
            host.abort_statement();
        }

        let teardown = host.close_statement(self, memory);
        host.finish_statement();
        result.and(teardown)
    }

    /// Run statements in order, continuing past failures
    pub fn execute_script(&self, commands: &[Command]) -> Vec<RollbackResult<()>> {
        commands.iter().map(|command| self.execute(command)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RollbackConfig;
    use crate::memory::MemoryQuery;

    fn session() -> Session<MemoryHost> {
        Session::builder(MemoryHost::new())
            .config(RollbackConfig::default())
            .with_statement_rollback()
            .build()
    }

    #[test]
    fn test_autocommit_statements() {
        let session = session();
        session.execute(&Command::create_table("t")).unwrap();
        session.execute(&Command::insert("t", [1, 2])).unwrap();
        assert_eq!(session.host().table("t"), Some(vec![1, 2]));
        assert!(!session.host().in_transaction_block());
        assert_eq!(session.host().open_portals(), 0);
    }

    #[test]
    fn test_failed_autocommit_statement_is_undone() {
        let session = session();
        session.execute(&Command::create_table("t")).unwrap();
        let err = session
            .execute(&Command::call(crate::memory::Function::new(
                "insert_then_fail",
                vec![Command::insert("t", [1]), Command::fail("boom")],
            )))
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(session.host().table("t"), Some(vec![]));
        assert_eq!(session.host().errors(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_aborted_block_rejects_statements() {
        let session = session();
        session.execute(&Command::create_table("t")).unwrap();
        session.execute(&Command::begin()).unwrap();
        assert!(session.execute(&Command::fail("boom")).is_err());
        assert!(session.host().is_aborted());

        let err = session.execute(&Command::insert("t", [1])).unwrap_err();
        assert!(err.to_string().starts_with("current transaction is aborted"));

        session.execute(&Command::rollback()).unwrap();
        assert!(!session.host().in_transaction_block());
    }

    #[test]
    fn test_last_rows_of_select() {
        let session = session();
        session.execute(&Command::create_table("t")).unwrap();
        session.execute(&Command::insert("t", [4, 5])).unwrap();
        session
            .execute(&Command::query(MemoryQuery::view(
                "v",
                MemoryQuery::select(["t"]),
            )))
            .unwrap();
        assert_eq!(session.host().last_rows(), vec![4, 5]);
    }
}
