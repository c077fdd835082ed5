//! Deterministic, pure logic for the commit workflow.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod classifier;
pub mod error;
pub mod machine;
pub mod message;
pub mod prompt;
pub mod types;
