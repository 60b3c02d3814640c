// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement classification

pub mod utility;
pub mod write;

pub use utility::{classify_utility, CheckpointIntent};
pub use write::is_write;
