//! Shared deterministic types for the workflow core.
//!
//! These types define the contracts between the state machine, the driver and
//! the collaborator tasks. They carry no I/O handles and are cheap to move
//! across threads.

/// Current phase of the commit workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Waiting on inspection or generation.
    Loading,
    /// Risky paths are staged; waiting for the user to continue or stop.
    Warning,
    /// A candidate message exists; waiting for the user to accept it.
    Confirm,
    /// `git commit` is running.
    Committing,
    /// Terminal: the run finished without error.
    Done(Completion),
    /// Terminal: a collaborator failed.
    Error,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Done(_) | WorkflowState::Error)
    }

    /// States that animate the spinner while a task is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, WorkflowState::Loading | WorkflowState::Committing)
    }
}

/// How a `Done` run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Committed,
    Cancelled,
}

/// Staged changes as seen by the change inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    /// Staged diff with dependency artifacts removed.
    pub diff_text: String,
    /// Staged paths under a risky directory prefix, in staging order.
    pub risky_paths: Vec<String>,
    /// Staged dependency artifacts left out of `diff_text`, in staging order.
    pub excluded_artifacts: Vec<String>,
}

/// Successful inspection result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    Staged(ChangeReport),
    NoStagedChanges,
}

/// Kind of primary task the driver can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Inspect,
    Generate,
    Commit,
}

/// A decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// `y` / `Y`.
    Affirm,
    /// Any other answer to a yes/no prompt.
    Decline,
    /// Abort the whole run (Ctrl+C, Esc, `q`).
    Cancel,
}
