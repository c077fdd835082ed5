//! Messages consumed by the state machine and effects it asks the driver to run.

use crate::core::types::{Input, Inspection, TaskKind};

/// Everything the driver feeds into [`crate::core::machine::Machine::transition`].
///
/// Task results are tagged with the generation of the task that produced them
/// so late results from superseded tasks can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    InspectionResult {
        generation: u64,
        inspection: Inspection,
    },
    InspectionFailed {
        generation: u64,
        reason: String,
    },
    GenerationResult {
        generation: u64,
        text: String,
    },
    GenerationFailed {
        generation: u64,
        reason: String,
    },
    CommitResult {
        generation: u64,
        result: Result<(), String>,
    },
    UserInput(Input),
    /// Spinner animation tick. Never changes the model.
    Tick,
}

impl Message {
    /// Task kind and generation for task results; `None` for input and ticks.
    pub fn task(&self) -> Option<(TaskKind, u64)> {
        match self {
            Message::InspectionResult { generation, .. }
            | Message::InspectionFailed { generation, .. } => {
                Some((TaskKind::Inspect, *generation))
            }
            Message::GenerationResult { generation, .. }
            | Message::GenerationFailed { generation, .. } => {
                Some((TaskKind::Generate, *generation))
            }
            Message::CommitResult { generation, .. } => Some((TaskKind::Commit, *generation)),
            Message::UserInput(_) | Message::Tick => None,
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Inspect { generation: u64 },
    Generate { generation: u64, prompt: String },
    Commit { generation: u64, message: String },
    /// Best-effort stop signal for the outstanding task.
    Cancel { generation: u64 },
}
