// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The statement rollback interceptor
//!
//! Brackets every stage with nesting guards and, once a top-level client
//! statement has completed successfully, rotates the automatic checkpoint.
//! Nested execution frames (function bodies, sub-plans) never touch
//! checkpoints; a nested write only leaves a deferred-restore mark for the
//! top-level statement to consume.

use crate::classify::{classify_utility, is_write, CheckpointIntent};
use crate::error::RollbackResult;
use crate::host::{CallOrigin, Host, PlanInfo, UtilityInfo};
use crate::session::Session;

use super::hook::{Next, PipelineHook};

/// Automatic statement rollback
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementRollback;

impl StatementRollback {
    pub fn new() -> Self {
        StatementRollback
    }

    /// Checkpoint action after a successful client utility statement
    fn after_utility<H: Host>(
        &self,
        session: &Session<H>,
        intent: CheckpointIntent,
    ) -> RollbackResult<()> {
        let checkpoints = session.checkpoints();
        match intent {
            CheckpointIntent::ReleaseAndAdd => {
                log::debug!(
                    "utility statement done, release and add savepoint (planner done {})",
                    session.nesting().planner_complete()
                );
                checkpoints.rotate()
            }
            CheckpointIntent::Add => {
                log::debug!("utility statement done, add savepoint");
                checkpoints.open_with_checkpoint()
            }
            CheckpointIntent::None
                if session.deferred().is_set() && session.nesting().is_top_level() =>
            {
                log::debug!("utility statement done, deferred release and add savepoint");
                checkpoints.rotate()
            }
            CheckpointIntent::None => Ok(()),
        }
    }
}

impl<H: Host> PipelineHook<H> for StatementRollback {
    fn name(&self) -> &'static str {
        "statement_rollback"
    }

    fn plan(
        &self,
        session: &Session<H>,
        query: &H::Query,
        next: Next<'_, H>,
    ) -> RollbackResult<H::Plan> {
        let _guard = session.nesting().enter_planner();
        next.plan(query)
    }

    fn process_utility(
        &self,
        session: &Session<H>,
        statement: &H::Utility,
        origin: CallOrigin,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        // Server-side calls and parallel workers are tracked, never acted on
        let ignored = origin.is_internal() || session.host().in_parallel_worker();

        let intent = if ignored {
            CheckpointIntent::None
        } else {
            classify_utility(
                statement.kind(),
                session.config(),
                session.transaction(),
                session.nesting().executor_depth(),
            )
        };

        {
            let _guard = session.nesting().enter_executor();
            next.process_utility(statement, origin)?;
        }

        if ignored {
            return Ok(());
        }

        let result = self.after_utility(session, intent);
        session.deferred().clear();
        result
    }

    fn executor_start(
        &self,
        session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        next.executor_start(desc)?;

        if session.host().in_parallel_worker() {
            return Ok(());
        }

        let nesting = session.nesting();
        let config = session.config();
        log::debug!(
            "executor start (executor level {}, planner done {}, operation {})",
            nesting.executor_depth(),
            nesting.planner_complete(),
            desc.command().as_str()
        );

        if !config.enabled || !nesting.planner_complete() {
            return Ok(());
        }

        if nesting.is_top_level() {
            session.checkpoints().save_scope()?;
        } else if config.write_only && is_write(&*desc) {
            log::debug!("nested write, deferring release and add savepoint");
            session.deferred().set();
        }
        Ok(())
    }

    fn executor_run(
        &self,
        session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        let _guard = session.nesting().enter_executor();
        next.executor_run(desc)
    }

    fn executor_finish(
        &self,
        session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        let _guard = session.nesting().enter_executor();
        next.executor_finish(desc)
    }

    fn executor_end(
        &self,
        session: &Session<H>,
        desc: &mut H::QueryDesc,
        next: Next<'_, H>,
    ) -> RollbackResult<()> {
        let nesting = session.nesting();
        let config = session.config();
        log::debug!(
            "executor end (executor level {}, planner done {}, operation {})",
            nesting.executor_depth(),
            nesting.planner_complete(),
            desc.command().as_str()
        );

        if !session.host().in_parallel_worker()
            && config.enabled
            && nesting.is_top_level()
            && nesting.planner_complete()
        {
            let checkpoints = session.checkpoints();
            let rotate = !config.write_only || session.deferred().is_set() || is_write(&*desc);
            let result = if rotate {
                checkpoints
                    .release_checkpoint()
                    .and_then(|()| checkpoints.add_checkpoint())
            } else {
                checkpoints.discard_saved_scope();
                Ok(())
            };
            session.deferred().clear();
            result?;
        }

        next.executor_end(desc)
    }
}
