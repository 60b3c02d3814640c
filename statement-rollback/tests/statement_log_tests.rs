//! Statement-log output of automatic checkpoint commands
//!
//! Log records are captured by a process-wide logger, so every test here is
//! serialized.

use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use serial_test::serial;

use statement_rollback::memory::{Command, MemoryHost};
use statement_rollback::{LogSettings, LogStatement, RollbackConfig, Session};

struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target() == "statement"
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) && record.level() == Level::Info {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: Lazy<CaptureLogger> = Lazy::new(|| CaptureLogger {
    lines: Mutex::new(Vec::new()),
});

/// Install the capturing logger and drop anything captured so far
fn capture() {
    let _ = log::set_logger(&*LOGGER);
    log::set_max_level(LevelFilter::Info);
    LOGGER.lines.lock().unwrap().clear();
}

fn captured() -> Vec<String> {
    LOGGER.lines.lock().unwrap().clone()
}

fn session(settings: LogSettings, config: RollbackConfig) -> Session<MemoryHost> {
    let session = Session::builder(MemoryHost::new().with_log_settings(settings))
        .config(config)
        .with_statement_rollback()
        .build();
    session.execute(&Command::create_table("t")).unwrap();
    session
}

const SAVEPOINT_LINE: &str = "statement: SAVEPOINT PgSLRAutoSvpt; /* automatic savepoint */";
const RELEASE_LINE: &str = "statement: RELEASE PgSLRAutoSvpt; /* automatic savepoint */";
const DURATION_LINE: &str = "duration: 0.01 ms";

#[test]
#[serial]
fn test_verbose_settings_log_statement_and_duration() {
    capture();
    let session = session(LogSettings::verbose(), RollbackConfig::default());

    session.execute(&Command::begin()).unwrap();
    session.execute(&Command::insert("t", [1])).unwrap();

    let expected = vec![
        SAVEPOINT_LINE,
        DURATION_LINE,
        RELEASE_LINE,
        DURATION_LINE,
        SAVEPOINT_LINE,
        DURATION_LINE,
    ];
    assert_eq!(session.host().log_lines(), expected);
    assert_eq!(captured(), expected);
}

#[test]
#[serial]
fn test_min_duration_zero_folds_statement_into_duration_line() {
    capture();
    let settings = LogSettings {
        log_statement: LogStatement::Mod,
        log_duration: false,
        log_min_duration_statement: Some(0),
    };
    let session = session(settings, RollbackConfig::default());

    session.execute(&Command::begin()).unwrap();
    session.execute(&Command::update("t", 1)).unwrap();

    assert_eq!(
        session.host().log_lines(),
        vec![
            "duration: 0.01 ms  statement: SAVEPOINT PgSLRAutoSvpt; /* automatic savepoint */",
            "duration: 0.01 ms  statement: RELEASE PgSLRAutoSvpt; /* automatic savepoint */",
            "duration: 0.01 ms  statement: SAVEPOINT PgSLRAutoSvpt; /* automatic savepoint */",
        ]
    );
}

#[test]
#[serial]
fn test_quiet_settings_log_nothing() {
    capture();
    let session = session(LogSettings::default(), RollbackConfig::default());

    session.execute(&Command::begin()).unwrap();
    session.execute(&Command::insert("t", [1])).unwrap();

    assert!(session.host().log_lines().is_empty());
    assert!(captured().is_empty());
    // Checkpoints are managed all the same
    assert_eq!(
        session.host().savepoint_names(),
        vec!["PgSLRAutoSvpt".to_string()]
    );
}

#[test]
#[serial]
fn test_settings_are_read_for_every_command() {
    capture();
    let session = session(LogSettings::default(), RollbackConfig::default());
    session.execute(&Command::begin()).unwrap();

    session.host().set_log_settings(LogSettings {
        log_statement: LogStatement::All,
        log_duration: false,
        log_min_duration_statement: None,
    });
    session.execute(&Command::delete("t")).unwrap();

    assert_eq!(session.host().log_lines(), vec![RELEASE_LINE, SAVEPOINT_LINE]);
    assert_eq!(captured(), vec![RELEASE_LINE, SAVEPOINT_LINE]);
}

#[test]
#[serial]
fn test_log_uses_configured_name() {
    capture();
    let config = RollbackConfig::default().with_checkpoint_name("stmt_sp");
    let session = session(LogSettings::verbose(), config);

    session.execute(&Command::begin()).unwrap();
    assert_eq!(
        session.host().log_lines(),
        vec![
            "statement: SAVEPOINT stmt_sp; /* automatic savepoint */",
            DURATION_LINE,
        ]
    );
}

#[test]
#[serial]
fn test_failed_statement_logs_no_checkpoint_command() {
    capture();
    let session = session(LogSettings::verbose(), RollbackConfig::default());
    session.execute(&Command::begin()).unwrap();
    session.host().take_diagnostics();
    LOGGER.lines.lock().unwrap().clear();

    assert!(session.execute(&Command::fail("boom")).is_err());
    session
        .execute(&Command::rollback_to("PgSLRAutoSvpt"))
        .unwrap();

    assert!(session.host().log_lines().is_empty());
    assert!(captured().is_empty());
    assert_eq!(session.host().errors(), vec!["boom".to_string()]);
}
