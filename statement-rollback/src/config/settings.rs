// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine-style setting names and value parsing

use super::{RollbackConfig, DEFAULT_CHECKPOINT_NAME};
use once_cell::sync::Lazy;
use thiserror::Error;

/// Namespace shared by every setting of this crate
pub const SETTINGS_PREFIX: &str = "pg_statement_rollback.";

pub const ENABLED: &str = "pg_statement_rollback.enabled";
pub const SAVEPOINT_NAME: &str = "pg_statement_rollback.savepoint_name";
pub const ENABLE_WRITEONLY: &str = "pg_statement_rollback.enable_writeonly";

/// Configuration loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unrecognized configuration parameter: {0}")]
    UnknownSetting(String),

    #[error("Invalid value for parameter {name}: \"{value}\"")]
    InvalidValue { name: String, value: String },

    #[error("Automatic savepoint name must not be empty")]
    EmptyCheckpointName,

    #[error("Automatic savepoint name \"{name}\" is longer than {max} bytes")]
    CheckpointNameTooLong { name: String, max: usize },

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

/// Value type of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    String,
}

/// Who may change a setting at runtime in the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingContext {
    /// Any user
    UserSet,
    /// Superusers, the startup packet or the configuration file
    SuperuserSet,
}

/// Registration data for one setting
#[derive(Debug, Clone)]
pub struct SettingDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: SettingKind,
    pub context: SettingContext,
    pub default: &'static str,
}

static SETTINGS: Lazy<Vec<SettingDescriptor>> = Lazy::new(|| {
    vec![
        SettingDescriptor {
            name: ENABLED,
            description: "Enable automatic savepoint",
            kind: SettingKind::Bool,
            context: SettingContext::UserSet,
            default: "on",
        },
        SettingDescriptor {
            name: SAVEPOINT_NAME,
            description: "Name of automatic savepoint",
            kind: SettingKind::String,
            context: SettingContext::SuperuserSet,
            default: DEFAULT_CHECKPOINT_NAME,
        },
        SettingDescriptor {
            name: ENABLE_WRITEONLY,
            description: "Create savepoint only on write command tag (INSERT/DELETE/UPDATE) \
                          and DDL commands. Call to function with nested write statements \
                          are fully supported.",
            kind: SettingKind::Bool,
            context: SettingContext::UserSet,
            default: "on",
        },
    ]
});

/// Every setting a host should register
pub fn descriptors() -> &'static [SettingDescriptor] {
    &SETTINGS
}

/// Look up a setting by name (case-insensitive, like the engine)
pub fn descriptor(name: &str) -> Option<&'static SettingDescriptor> {
    SETTINGS.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// Parse a boolean the way the engine does
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | "t" | "y" => Some(true),
        "off" | "false" | "no" | "0" | "f" | "n" => Some(false),
        _ => None,
    }
}

pub(crate) fn apply(config: &mut RollbackConfig, name: &str, value: &str) -> Result<(), ConfigError> {
    if !name.to_ascii_lowercase().starts_with(SETTINGS_PREFIX) {
        log::debug!("Ignoring setting outside the rollback namespace: {}", name);
        return Ok(());
    }

    let descriptor =
        descriptor(name).ok_or_else(|| ConfigError::UnknownSetting(name.to_string()))?;

    let invalid = || ConfigError::InvalidValue {
        name: descriptor.name.to_string(),
        value: value.to_string(),
    };

    match descriptor.name {
        ENABLED => config.enabled = parse_bool(value).ok_or_else(invalid)?,
        ENABLE_WRITEONLY => config.write_only = parse_bool(value).ok_or_else(invalid)?,
        SAVEPOINT_NAME => config.checkpoint_name = value.trim().to_string(),
        _ => return Err(ConfigError::UnknownSetting(name.to_string())),
    }
    Ok(())
}
