// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Automatic checkpoint lifecycle
//!
//! Every operation is legal only outside every execution stage
//! (executor depth zero). A violated precondition is an internal fault and
//! never a statement fault.

use crate::error::{RollbackError, RollbackResult};
use crate::host::Host;
use crate::session::Session;

use super::handoff::SavedScope;
use super::statement_log::{log_checkpoint_command, CheckpointCommand};

/// Checkpoint operations of one session
pub struct CheckpointManager<'a, H: Host> {
    session: &'a Session<H>,
}

impl<'a, H: Host> CheckpointManager<'a, H> {
    pub fn new(session: &'a Session<H>) -> Self {
        Self { session }
    }

    /// Automatic checkpoints are managed for this session right now
    pub fn active(&self) -> bool {
        self.session.config().enabled && self.session.transaction().is_open()
    }

    fn require_top_level(&self, operation: &str) -> RollbackResult<()> {
        let depth = self.session.nesting().executor_depth();
        if depth != 0 {
            let err = RollbackError::internal(format!(
                "{} called at executor nesting level {}.",
                operation, depth
            ));
            log::error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    /// Remember the active ownership scope and the current statement memory
    /// before a checkpoint gets defined
    pub fn save_scope(&self) -> RollbackResult<()> {
        self.require_top_level("save_scope")?;
        if let Some(saved) = self.session.handoff().saved() {
            let err = RollbackError::internal(format!(
                "resource owner {} is already saved.",
                saved.scope
            ));
            log::error!("{}", err);
            return Err(err);
        }

        if self.active() {
            let host = self.session.host();
            let saved = SavedScope {
                scope: host.active_scope(),
                statement_memory: host.statement_memory(),
            };
            log::debug!("saving the resource owner {}", saved.scope);
            self.session.handoff().save(saved)?;
        }
        Ok(())
    }

    /// Define the automatic checkpoint and hand the statement back to the
    /// scope it started under
    pub fn add_checkpoint(&self) -> RollbackResult<()> {
        self.require_top_level("add_checkpoint")?;
        if !self.active() {
            return Ok(());
        }

        let session = self.session;
        let host = session.host();
        let name = session.config().checkpoint_name.as_str();

        log::debug!("adding savepoint {}", name);
        host.define_checkpoint(name)?;
        host.finalize_unit_of_work()?;

        let new_scope = host.active_scope();
        let saved = session
            .handoff()
            .take_saved()
            .ok_or_else(|| RollbackError::internal("no resource owner."))?;
        let memory = saved
            .statement_memory
            .ok_or_else(|| RollbackError::internal("no portal context."))?;

        session.handoff().park_new(new_scope)?;
        host.set_active_scope(saved.scope);

        log::debug!(
            "registering the restore of {} on teardown of {}",
            new_scope,
            memory
        );
        host.register_teardown(
            memory,
            Box::new(|session: &Session<H>| session.checkpoints().restore_scope()),
        )?;

        session.transaction().set_checkpoint_pending(true);
        Ok(())
    }

    /// Teardown callback: adopt the scope allocated by the last checkpoint
    pub fn restore_scope(&self) -> RollbackResult<()> {
        self.require_top_level("restore_scope")?;
        let Some(scope) = self.session.handoff().take_new() else {
            return Ok(());
        };

        if self.active() {
            log::debug!("restoring the resource owner {}", scope);
            self.session.host().set_active_scope(scope);
            log_checkpoint_command(self.session, CheckpointCommand::Savepoint);
        }
        Ok(())
    }

    /// Release the automatic checkpoint, if one exists
    pub fn release_checkpoint(&self) -> RollbackResult<()> {
        self.require_top_level("release_checkpoint")?;
        let session = self.session;
        if !self.active() || !session.transaction().checkpoint_pending() {
            return Ok(());
        }

        let host = session.host();
        let name = session.config().checkpoint_name.as_str();
        log::debug!("releasing savepoint {}", name);
        host.release_checkpoint(name)?;
        host.finalize_unit_of_work()?;
        session.transaction().set_checkpoint_pending(false);

        log_checkpoint_command(session, CheckpointCommand::Release);
        Ok(())
    }

    /// Drop a saved scope no checkpoint consumed. Returns whether one was
    /// saved.
    pub fn discard_saved_scope(&self) -> bool {
        match self.session.handoff().take_saved() {
            Some(saved) => {
                log::debug!("discarding the saved resource owner {}", saved.scope);
                true
            }
            None => false,
        }
    }

    /// Replace the automatic checkpoint with a fresh one
    pub fn rotate(&self) -> RollbackResult<()> {
        self.save_scope()?;
        self.release_checkpoint()?;
        self.add_checkpoint()
    }

    /// Define the first checkpoint of a transaction block that was just
    /// opened
    pub fn open_with_checkpoint(&self) -> RollbackResult<()> {
        self.save_scope()?;
        if self.active() {
            self.session.host().finalize_unit_of_work()?;
        }
        self.add_checkpoint()
    }
}
