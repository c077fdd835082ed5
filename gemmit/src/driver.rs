//! Workflow driver: owns the model, runs effects as tasks, feeds results back.
//!
//! The driver is the only code that mutates the [`WorkflowModel`]. Each loop
//! iteration takes one message from the queue, applies
//! [`Machine::transition`], launches the returned effect, keeps the spinner
//! ticker in step with the state and redraws.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::machine::{Machine, WorkflowModel};
use crate::core::message::{Effect, Message};
use crate::io::committer::CommitApplier;
use crate::io::generator::{SummaryGenerator, normalize_message};
use crate::io::inspector::ChangeInspector;
use crate::tasks::{TaskHandle, Ticker, spawn_task};

/// Where the driver draws the model after every transition.
pub trait Surface {
    fn draw(&mut self, model: &WorkflowModel, frame: usize) -> Result<()>;
}

/// Driver tuning.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub spinner_interval: Duration,
    /// Keep only the first line of generated text.
    pub single_line: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            spinner_interval: Duration::from_millis(100),
            single_line: true,
        }
    }
}

/// Collaborators used by the driver's tasks.
#[derive(Clone)]
pub struct Collaborators {
    pub inspector: Arc<dyn ChangeInspector>,
    pub generator: Arc<dyn SummaryGenerator>,
    pub committer: Arc<dyn CommitApplier>,
}

pub struct Driver {
    machine: Machine,
    collaborators: Collaborators,
    options: DriverOptions,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    outstanding: Option<TaskHandle>,
    ticker: Option<Ticker>,
    frame: usize,
}

impl Driver {
    pub fn new(machine: Machine, collaborators: Collaborators, options: DriverOptions) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            machine,
            collaborators,
            options,
            tx,
            rx,
            outstanding: None,
            ticker: None,
            frame: 0,
        }
    }

    /// Queue handle for input sources (key reader, tests).
    pub fn sender(&self) -> Sender<Message> {
        self.tx.clone()
    }

    /// Run until the model reaches a terminal state and return it.
    pub fn run<S: Surface>(mut self, surface: &mut S) -> Result<WorkflowModel> {
        let (mut model, effect) = WorkflowModel::start();
        info!("workflow started");
        self.dispatch(Some(effect))?;
        self.sync_ticker(&model);
        surface.draw(&model, self.frame)?;

        while !model.is_terminal() {
            let message = self
                .rx
                .recv()
                .context("workflow message queue closed")?;
            match &message {
                Message::Tick => self.frame = self.frame.wrapping_add(1),
                Message::UserInput(input) => debug!(state = ?model.state, ?input, "user input"),
                other => debug!(state = ?model.state, task = ?other.task(), "task result"),
            }
            let before = model.state;
            let (next, effect) = self.machine.transition(model, message);
            model = next;
            if model.state != before {
                debug!(from = ?before, to = ?model.state, generation = model.generation(), "transition");
            }
            self.dispatch(effect)?;
            self.sync_ticker(&model);
            surface.draw(&model, self.frame)?;
        }

        self.ticker = None;
        info!(state = ?model.state, "workflow finished");
        Ok(model)
    }

    fn dispatch(&mut self, effect: Option<Effect>) -> Result<()> {
        let Some(effect) = effect else {
            return Ok(());
        };
        let tx = self.tx.clone();
        let handle = match effect {
            Effect::Inspect { generation } => {
                let inspector = Arc::clone(&self.collaborators.inspector);
                spawn_task("inspect", generation, tx, move |_| {
                    match inspector.inspect() {
                        Ok(inspection) => Message::InspectionResult {
                            generation,
                            inspection,
                        },
                        Err(err) => Message::InspectionFailed {
                            generation,
                            reason: format!("{err:#}"),
                        },
                    }
                })?
            }
            Effect::Generate { generation, prompt } => {
                let generator = Arc::clone(&self.collaborators.generator);
                let single_line = self.options.single_line;
                spawn_task("generate", generation, tx, move |cancel| {
                    match generator.generate(&prompt, cancel) {
                        Ok(raw) => Message::GenerationResult {
                            generation,
                            text: normalize_message(&raw, single_line),
                        },
                        Err(err) => Message::GenerationFailed {
                            generation,
                            reason: format!("{err:#}"),
                        },
                    }
                })?
            }
            Effect::Commit {
                generation,
                message,
            } => {
                let committer = Arc::clone(&self.collaborators.committer);
                spawn_task("commit", generation, tx, move |_| Message::CommitResult {
                    generation,
                    result: committer.commit(&message).map_err(|err| format!("{err:#}")),
                })?
            }
            Effect::Cancel { generation } => {
                match self.outstanding.take() {
                    Some(handle) if handle.generation == generation => {
                        debug!(generation, "cancelling outstanding task");
                        handle.token.cancel();
                    }
                    Some(handle) => {
                        debug!(
                            generation,
                            outstanding = handle.generation,
                            "cancel does not match the outstanding task"
                        );
                    }
                    None => {}
                }
                return Ok(());
            }
        };
        self.outstanding = Some(handle);
        Ok(())
    }

    fn sync_ticker(&mut self, model: &WorkflowModel) {
        let busy = model.state.is_busy();
        match (busy, self.ticker.is_some()) {
            (true, false) => {
                self.ticker = Some(Ticker::start(self.tx.clone(), self.options.spinner_interval));
            }
            (false, true) => {
                self.ticker = None;
            }
            _ => {}
        }
    }
}
