// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Planner and executor nesting depth tracking
//!
//! Every forwarded stage call is bracketed by a guard. The guard restores
//! the counter when it is dropped, so faults (and panics) unwinding through
//! any number of nested frames leave the counters where they were.

use std::cell::Cell;

/// Nesting counters of one session
#[derive(Debug, Default)]
pub struct NestingTracker {
    executor_depth: Cell<u32>,
    planner_depth: Cell<u32>,
    planner_complete: Cell<bool>,
}

/// Point-in-time copy of the nesting counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NestingSnapshot {
    pub executor_depth: u32,
    pub planner_depth: u32,
    pub planner_complete: bool,
}

impl NestingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executor_depth(&self) -> u32 {
        self.executor_depth.get()
    }

    pub fn planner_depth(&self) -> u32 {
        self.planner_depth.get()
    }

    /// True once planning of the current top-level statement, sub-plans
    /// included, has fully finished
    pub fn planner_complete(&self) -> bool {
        self.planner_complete.get()
    }

    pub fn is_top_level(&self) -> bool {
        self.executor_depth.get() == 0
    }

    pub fn snapshot(&self) -> NestingSnapshot {
        NestingSnapshot {
            executor_depth: self.executor_depth.get(),
            planner_depth: self.planner_depth.get(),
            planner_complete: self.planner_complete.get(),
        }
    }

    /// Enter an execution stage; the returned guard exits it
    pub fn enter_executor(&self) -> ExecutorGuard<'_> {
        self.executor_depth.set(self.executor_depth.get() + 1);
        log::debug!(
            "increase nest executor level (executor {}, planner {}, planner done {})",
            self.executor_depth.get(),
            self.planner_depth.get(),
            self.planner_complete.get()
        );
        ExecutorGuard { tracker: self }
    }

    pub(crate) fn exit_executor(&self) {
        match self.executor_depth.get().checked_sub(1) {
            Some(depth) => self.executor_depth.set(depth),
            None => log::error!("executor nesting level would drop below zero"),
        }
        log::debug!(
            "decrease nest executor level (executor {})",
            self.executor_depth.get()
        );
    }

    /// Enter the planner; the returned guard exits it.
    ///
    /// A planner entered with both counters at zero starts a fresh
    /// top-level statement.
    pub fn enter_planner(&self) -> PlannerGuard<'_> {
        if self.executor_depth.get() == 0 && self.planner_depth.get() == 0 {
            self.planner_complete.set(false);
        }
        self.planner_depth.set(self.planner_depth.get() + 1);
        log::debug!(
            "increase nest planner level (executor {}, planner {}, planner done {})",
            self.executor_depth.get(),
            self.planner_depth.get(),
            self.planner_complete.get()
        );
        PlannerGuard { tracker: self }
    }

    pub(crate) fn exit_planner(&self) {
        match self.planner_depth.get().checked_sub(1) {
            Some(depth) => self.planner_depth.set(depth),
            None => log::error!("planner nesting level would drop below zero"),
        }
        if self.executor_depth.get() == 0 && self.planner_depth.get() == 0 {
            log::debug!("mark planner stage as done");
            self.planner_complete.set(true);
        }
    }
}

/// Scoped executor nesting level
#[must_use = "the executor level is left as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ExecutorGuard<'a> {
    tracker: &'a NestingTracker,
}

impl Drop for ExecutorGuard<'_> {
    fn drop(&mut self) {
        self.tracker.exit_executor();
    }
}

/// Scoped planner nesting level
#[must_use = "the planner level is left as soon as the guard is dropped"]
#[derive(Debug)]
pub struct PlannerGuard<'a> {
    tracker: &'a NestingTracker,
}

impl Drop for PlannerGuard<'_> {
    fn drop(&mut self) {
        self.tracker.exit_planner();
    }
}
