// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Deferred checkpoint rotation
//!
//! Set when a nested frame writes beneath a top-level statement that was
//! not known to write, consumed when that top-level statement ends.

use std::cell::Cell;

#[derive(Debug, Default)]
pub struct DeferredRestore {
    pending: Cell<bool>,
}

impl DeferredRestore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.pending.get()
    }

    pub(crate) fn set(&self) {
        self.pending.set(true);
    }

    /// Clear the flag, returning whether it was set
    pub(crate) fn take(&self) -> bool {
        self.pending.replace(false)
    }

    pub(crate) fn clear(&self) {
        self.pending.set(false);
    }
}
