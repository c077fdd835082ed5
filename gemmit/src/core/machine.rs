//! Workflow state machine.
//!
//! [`Machine::transition`] is the only place the workflow model changes. It
//! consumes one message, returns the next model, and optionally an [`Effect`]
//! for the driver to launch. It performs no I/O.
//!
//! Task results are accepted only when they belong to the task currently in
//! flight: same [`TaskKind`] and same generation. Anything else is a late
//! result from a superseded or cancelled task and is dropped unchanged.

use tracing::debug;

use crate::core::error::WorkflowError;
use crate::core::message::{Effect, Message};
use crate::core::prompt::PromptBuilder;
use crate::core::types::{ChangeReport, Completion, Input, Inspection, TaskKind, WorkflowState};

/// The single mutable record of a run. Owned by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowModel {
    pub state: WorkflowState,
    /// Generator input, kept from inspection until generation succeeds.
    pub pending_prompt: Option<String>,
    /// Generated message; present in `Confirm`, `Committing` and committed `Done`.
    pub candidate_message: Option<String>,
    /// Non-empty only while in `Warning`.
    pub risky_paths: Vec<String>,
    /// Set once the user has continued past `Warning`.
    pub warning_acknowledged: bool,
    /// Dependency artifacts left out of the prompt.
    pub excluded_artifacts: Vec<String>,
    /// Present only in `Error`.
    pub failure: Option<WorkflowError>,
    generation: u64,
    outstanding: Option<TaskKind>,
}

impl WorkflowModel {
    /// Initial model plus the inspection effect that starts every run.
    pub fn start() -> (Self, Effect) {
        let mut model = Self {
            state: WorkflowState::Loading,
            pending_prompt: None,
            candidate_message: None,
            risky_paths: Vec::new(),
            warning_acknowledged: false,
            excluded_artifacts: Vec::new(),
            failure: None,
            generation: 0,
            outstanding: None,
        };
        let generation = model.schedule(TaskKind::Inspect);
        (model, Effect::Inspect { generation })
    }

    /// Generation of the most recently scheduled task.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Kind of the primary task in flight, if any.
    pub fn outstanding(&self) -> Option<TaskKind> {
        self.outstanding
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Final result of a finished run; `None` while the run is still going.
    ///
    /// Cancellation is reported as [`WorkflowError::UserCancelled`].
    pub fn outcome(&self) -> Option<Result<(), WorkflowError>> {
        match self.state {
            WorkflowState::Done(Completion::Committed) => Some(Ok(())),
            WorkflowState::Done(Completion::Cancelled) => Some(Err(WorkflowError::UserCancelled)),
            WorkflowState::Error => Some(Err(self
                .failure
                .clone()
                .unwrap_or_else(|| WorkflowError::InspectionFailed("unknown failure".to_string())))),
            _ => None,
        }
    }

    fn schedule(&mut self, kind: TaskKind) -> u64 {
        self.generation += 1;
        self.outstanding = Some(kind);
        self.generation
    }

    fn accepts(&self, kind: TaskKind, generation: u64) -> bool {
        self.outstanding == Some(kind) && self.generation == generation
    }

    fn fail(mut self, err: WorkflowError) -> (Self, Option<Effect>) {
        self.state = WorkflowState::Error;
        self.failure = Some(err);
        self.pending_prompt = None;
        self.candidate_message = None;
        self.risky_paths.clear();
        self.outstanding = None;
        (self, None)
    }

    fn cancel(mut self) -> (Self, Option<Effect>) {
        let effect = self.outstanding.take().map(|_| Effect::Cancel {
            generation: self.generation,
        });
        self.state = WorkflowState::Done(Completion::Cancelled);
        self.pending_prompt = None;
        self.candidate_message = None;
        self.risky_paths.clear();
        (self, effect)
    }
}

/// Pure transition function plus the prompt renderer it needs.
#[derive(Debug, Default)]
pub struct Machine {
    prompts: PromptBuilder,
}

impl Machine {
    pub fn new(prompts: PromptBuilder) -> Self {
        Self { prompts }
    }

    /// Apply one message.
    pub fn transition(
        &self,
        model: WorkflowModel,
        message: Message,
    ) -> (WorkflowModel, Option<Effect>) {
        if model.is_terminal() {
            return (model, None);
        }
        if let Some((kind, generation)) = message.task()
            && !model.accepts(kind, generation)
        {
            debug!(
                ?kind,
                generation,
                current = model.generation,
                "discarding stale task result"
            );
            return (model, None);
        }

        match message {
            Message::Tick => (model, None),
            Message::UserInput(input) => self.on_input(model, input),
            Message::InspectionResult { inspection, .. } => self.on_inspection(model, inspection),
            Message::InspectionFailed { reason, .. } => {
                model.fail(WorkflowError::InspectionFailed(reason))
            }
            Message::GenerationResult { text, .. } => on_generated(model, text),
            Message::GenerationFailed { reason, .. } => {
                model.fail(WorkflowError::GenerationFailed(reason))
            }
            Message::CommitResult { result, .. } => on_committed(model, result),
        }
    }

    fn on_inspection(
        &self,
        mut model: WorkflowModel,
        inspection: Inspection,
    ) -> (WorkflowModel, Option<Effect>) {
        model.outstanding = None;
        let report = match inspection {
            Inspection::NoStagedChanges => return model.fail(WorkflowError::NoStagedChanges),
            Inspection::Staged(report) => report,
        };
        let ChangeReport {
            risky_paths,
            excluded_artifacts,
            ..
        } = &report;
        let prompt = match self.prompts.render(&report) {
            Ok(prompt) => prompt,
            Err(err) => {
                return model.fail(WorkflowError::GenerationFailed(format!(
                    "render prompt: {err:#}"
                )));
            }
        };
        model.excluded_artifacts = excluded_artifacts.clone();
        if !risky_paths.is_empty() {
            model.risky_paths = risky_paths.clone();
            model.pending_prompt = Some(prompt);
            model.state = WorkflowState::Warning;
            return (model, None);
        }
        schedule_generate(model, prompt)
    }

    fn on_input(&self, mut model: WorkflowModel, input: Input) -> (WorkflowModel, Option<Effect>) {
        match (model.state, input) {
            (WorkflowState::Warning, Input::Affirm) => {
                model.risky_paths.clear();
                model.warning_acknowledged = true;
                match model.pending_prompt.clone() {
                    Some(prompt) => schedule_generate(model, prompt),
                    None => model.fail(WorkflowError::GenerationFailed(
                        "no prompt was prepared".to_string(),
                    )),
                }
            }
            (WorkflowState::Confirm, Input::Affirm) => match model.candidate_message.clone() {
                Some(message) => {
                    model.state = WorkflowState::Committing;
                    let generation = model.schedule(TaskKind::Commit);
                    (
                        model,
                        Some(Effect::Commit {
                            generation,
                            message,
                        }),
                    )
                }
                None => model.fail(WorkflowError::CommitFailed(
                    "no commit message to apply".to_string(),
                )),
            },
            (WorkflowState::Warning | WorkflowState::Confirm, _) => model.cancel(),
            // A commit already handed to git runs to completion.
            (WorkflowState::Committing, _) => (model, None),
            (_, Input::Cancel) => model.cancel(),
            // Keystrokes other than cancel are ignored while a task runs.
            _ => (model, None),
        }
    }
}

fn schedule_generate(mut model: WorkflowModel, prompt: String) -> (WorkflowModel, Option<Effect>) {
    model.state = WorkflowState::Loading;
    model.pending_prompt = Some(prompt.clone());
    let generation = model.schedule(TaskKind::Generate);
    (model, Some(Effect::Generate { generation, prompt }))
}

fn on_generated(mut model: WorkflowModel, text: String) -> (WorkflowModel, Option<Effect>) {
    model.outstanding = None;
    let text = text.trim();
    if text.is_empty() {
        return model.fail(WorkflowError::GenerationFailed(
            "generator returned an empty message".to_string(),
        ));
    }
    model.pending_prompt = None;
    model.candidate_message = Some(text.to_string());
    model.state = WorkflowState::Confirm;
    (model, None)
}

fn on_committed(
    mut model: WorkflowModel,
    result: Result<(), String>,
) -> (WorkflowModel, Option<Effect>) {
    model.outstanding = None;
    match result {
        Ok(()) => {
            model.state = WorkflowState::Done(Completion::Committed);
            (model, None)
        }
        Err(reason) => model.fail(WorkflowError::CommitFailed(reason)),
    }
}
