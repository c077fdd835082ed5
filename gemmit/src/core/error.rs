//! Failure taxonomy for a workflow run.
//!
//! Every collaborator failure is carried verbatim into one of these variants
//! and surfaced as the terminal `Error` state. `UserCancelled` is the one
//! variant that is not a failure: it describes a normal, zero-exit outcome.

use thiserror::Error;

/// Why a workflow run stopped without committing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The index has nothing staged.
    #[error("no changes are staged")]
    NoStagedChanges,

    /// Reading the staged changes failed (git missing, not a repository, ...).
    #[error("failed to inspect staged changes: {0}")]
    InspectionFailed(String),

    /// The summary generator returned an error or an unusable response.
    #[error("failed to generate commit message: {0}")]
    GenerationFailed(String),

    /// `git commit` was attempted and failed.
    #[error("failed to commit: {0}")]
    CommitFailed(String),

    /// The user declined or aborted. Not a failure.
    #[error("commit canceled")]
    UserCancelled,
}

impl WorkflowError {
    /// True for every variant that should end the process with a non-zero code.
    pub fn is_failure(&self) -> bool {
        !matches!(self, WorkflowError::UserCancelled)
    }
}
