// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Configuration for automatic statement rollback
//!
//! Configuration is resolved once when a session is built and is read-only
//! afterwards. It can be built directly, loaded from engine-style
//! `name = value` settings or from JSON.

pub mod logging;
pub mod settings;

pub use logging::{LogSettings, LogStatement};
pub use settings::{descriptors, ConfigError, SettingContext, SettingDescriptor, SettingKind};

use serde::{Deserialize, Serialize};

/// Default name of the automatic checkpoint. Chosen so it is unlikely to
/// collide with a savepoint name picked by a client.
pub const DEFAULT_CHECKPOINT_NAME: &str = "PgSLRAutoSvpt";

/// Longest checkpoint name the engine keeps without truncation
pub const MAX_CHECKPOINT_NAME_LEN: usize = 63;

/// Automatic checkpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    /// Enable/disable automatic checkpoints entirely
    pub enabled: bool,

    /// Name used for every automatic checkpoint
    pub checkpoint_name: String,

    /// Only rotate the checkpoint after statements that write (or DDL).
    /// Writes performed by functions called from a read statement are
    /// detected as well.
    pub write_only: bool,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            checkpoint_name: DEFAULT_CHECKPOINT_NAME.to_string(),
            write_only: true,
        }
    }
}

impl RollbackConfig {
    /// Configuration with automatic checkpoints turned off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Configuration rotating the checkpoint after every statement,
    /// read-only ones included
    pub fn all_statements() -> Self {
        Self {
            write_only: false,
            ..Self::default()
        }
    }

    /// Use a different checkpoint name
    pub fn with_checkpoint_name(mut self, name: impl Into<String>) -> Self {
        self.checkpoint_name = name.into();
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_name.trim().is_empty() {
            return Err(ConfigError::EmptyCheckpointName);
        }
        if self.checkpoint_name.len() > MAX_CHECKPOINT_NAME_LEN {
            return Err(ConfigError::CheckpointNameTooLong {
                name: self.checkpoint_name.clone(),
                max: MAX_CHECKPOINT_NAME_LEN,
            });
        }
        Ok(())
    }

    /// Build a configuration from engine-style settings
    ///
    /// Keys use the `pg_statement_rollback.` namespace. Keys outside the
    /// namespace are ignored so a full engine configuration can be passed
    /// through; unknown keys inside it are rejected.
    pub fn from_settings<I, K, V>(settings: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (name, value) in settings {
            settings::apply(&mut config, name.as_ref(), value.as_ref())?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
