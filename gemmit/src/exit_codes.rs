//! Stable exit codes for the gemmit CLI.

use crate::core::error::WorkflowError;

/// Committed, or the user cancelled.
pub const OK: i32 = 0;
/// Setup failed or the workflow ended in `Error`.
pub const FAILED: i32 = 1;

/// Exit code for a finished run's outcome.
pub fn for_outcome(outcome: &Result<(), WorkflowError>) -> i32 {
    match outcome {
        Ok(()) => OK,
        Err(err) if err.is_failure() => FAILED,
        Err(_) => OK,
    }
}
