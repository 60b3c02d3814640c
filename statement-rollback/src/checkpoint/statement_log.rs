// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement-log lines for automatic checkpoint commands
//!
//! Automatic checkpoints never go through the engine's statement log, so
//! they are written by hand in the same format, tagged with a comment.
//! The checkpoint is created in two steps, which makes a measured duration
//! meaningless; a fixed placeholder is printed instead.

use crate::config::LogSettings;
use crate::host::{Diagnostic, Host};
use crate::session::Session;

/// Placeholder duration printed for automatic checkpoint commands
pub const PLACEHOLDER_DURATION_MS: &str = "0.01";

/// Checkpoint commands issued on behalf of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointCommand {
    Savepoint,
    Release,
}

impl CheckpointCommand {
    pub fn keyword(&self) -> &'static str {
        match self {
            CheckpointCommand::Savepoint => "SAVEPOINT",
            CheckpointCommand::Release => "RELEASE",
        }
    }
}

/// Render the log lines for one automatic checkpoint command
pub fn render_statement_log(
    command: CheckpointCommand,
    checkpoint_name: &str,
    settings: &LogSettings,
) -> Vec<String> {
    let statement = format!(
        "{} {}; /* automatic savepoint */",
        command.keyword(),
        checkpoint_name
    );
    let mut lines = Vec::new();

    let statement_logged = settings.logs_transaction_statements();
    if statement_logged {
        lines.push(format!("statement: {}", statement));
    }

    if settings.logs_durations() {
        if statement_logged {
            lines.push(format!("duration: {} ms", PLACEHOLDER_DURATION_MS));
        } else {
            lines.push(format!(
                "duration: {} ms  statement: {}",
                PLACEHOLDER_DURATION_MS, statement
            ));
        }
    }

    lines
}

/// Write the log lines for `command` through the session's diagnostic chain
pub(crate) fn log_checkpoint_command<H: Host>(session: &Session<H>, command: CheckpointCommand) {
    let settings = session.host().log_settings();
    for line in render_statement_log(command, &session.config().checkpoint_name, &settings) {
        log::info!(target: "statement", "{}", line);
        session.report(Diagnostic::log(line).hide_statement());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogStatement;

    #[test]
    fn test_nothing_logged_by_default() {
        let lines = render_statement_log(
            CheckpointCommand::Savepoint,
            "PgSLRAutoSvpt",
            &LogSettings::default(),
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn test_statement_and_duration_lines() {
        let lines = render_statement_log(
            CheckpointCommand::Release,
            "PgSLRAutoSvpt",
            &LogSettings::verbose(),
        );
        assert_eq!(
            lines,
            vec![
                "statement: RELEASE PgSLRAutoSvpt; /* automatic savepoint */".to_string(),
                "duration: 0.01 ms".to_string(),
            ]
        );
    }

    #[test]
    fn test_duration_line_carries_statement_when_not_logged() {
        let settings = LogSettings {
            log_statement: LogStatement::Mod,
            log_duration: false,
            log_min_duration_statement: Some(0),
        };
        let lines = render_statement_log(CheckpointCommand::Savepoint, "auto", &settings);
        assert_eq!(
            lines,
            vec!["duration: 0.01 ms  statement: SAVEPOINT auto; /* automatic savepoint */"
                .to_string()]
        );
    }
}
