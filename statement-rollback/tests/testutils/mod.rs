//! Test utilities for statement rollback integration tests
//!
//! - TestFixture: a session over the in-memory engine with assertion helpers
//! - StageRecorder: a pipeline hook recording every stage it sees

pub mod test_fixture;
