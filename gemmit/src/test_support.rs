//! Test-only collaborators and fixtures.
//!
//! Scripted implementations of the collaborator traits return predetermined
//! results and record how they were called. [`ScriptedSurface`] plays the user:
//! it answers prompts by pushing input into the driver's queue when the drawn
//! model matches a cue.

#[cfg(feature = "test-support")]
use std::path::{Path, PathBuf};
#[cfg(feature = "test-support")]
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};

use crate::core::machine::WorkflowModel;
use crate::core::message::Message;
use crate::core::types::{ChangeReport, Input, Inspection, TaskKind, WorkflowState};
use crate::driver::Surface;
use crate::io::committer::CommitApplier;
use crate::io::generator::SummaryGenerator;
use crate::io::inspector::ChangeInspector;
use crate::render::{Theme, render};
use crate::tasks::CancelToken;

/// Inspector returning a fixed result.
#[derive(Debug, Clone)]
pub struct ScriptedInspector {
    result: Result<Inspection, String>,
}

impl ScriptedInspector {
    pub fn staged(report: ChangeReport) -> Self {
        Self {
            result: Ok(Inspection::Staged(report)),
        }
    }

    pub fn nothing_staged() -> Self {
        Self {
            result: Ok(Inspection::NoStagedChanges),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
        }
    }
}

impl ChangeInspector for ScriptedInspector {
    fn inspect(&self) -> Result<Inspection> {
        self.result.clone().map_err(|reason| anyhow!(reason))
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
    /// Block until cancelled.
    Block,
}

/// Generator returning a fixed reply and recording every prompt it receives.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    reply: Reply,
    prompts: Arc<Mutex<Vec<String>>>,
    saw_cancel: Arc<AtomicBool>,
}

impl ScriptedGenerator {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Arc::default(),
            saw_cancel: Arc::default(),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_reply(Reply::Fail(reason.to_string()))
    }

    /// Never answers on its own; returns an error once its task is cancelled.
    pub fn blocking() -> Self {
        Self::with_reply(Reply::Block)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }

    /// Wait until a blocking generation observed its cancel token.
    pub fn wait_cancelled(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.saw_cancel.load(Ordering::SeqCst) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        self.saw_cancel.load(Ordering::SeqCst)
    }
}

impl SummaryGenerator for ScriptedGenerator {
    fn label(&self) -> &str {
        "Gemini"
    }

    fn generate(&self, prompt: &str, cancel: &CancelToken) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(reason) => Err(anyhow!(reason.clone())),
            Reply::Block => {
                while !cancel.is_cancelled() {
                    thread::sleep(Duration::from_millis(2));
                }
                self.saw_cancel.store(true, Ordering::SeqCst);
                bail!("cancelled")
            }
        }
    }
}

/// Committer recording every message it is asked to commit.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommitter {
    failure: Option<String>,
    delay: Option<Duration>,
    messages: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCommitter {
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Succeeds after `delay`, like a commit running slow hooks.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl CommitApplier for ScriptedCommitter {
    fn commit(&self, message: &str) -> Result<()> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        match &self.failure {
            Some(reason) => Err(anyhow!(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Situations a [`ScriptedSurface`] can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Before any generation is scheduled.
    Inspecting,
    Warning,
    Generating,
    Confirm,
    Committing,
}

impl Cue {
    fn matches(self, model: &WorkflowModel) -> bool {
        match self {
            Cue::Inspecting => model.outstanding() == Some(TaskKind::Inspect),
            Cue::Warning => model.state == WorkflowState::Warning,
            Cue::Generating => {
                model.state == WorkflowState::Loading
                    && model.outstanding() == Some(TaskKind::Generate)
            }
            Cue::Confirm => model.state == WorkflowState::Confirm,
            Cue::Committing => model.state == WorkflowState::Committing,
        }
    }
}

#[derive(Debug)]
struct Step {
    cue: Cue,
    min_frame: usize,
    input: Input,
    fired: bool,
}

/// Surface that answers prompts from a script and records what it drew.
///
/// Each scripted step fires once, the first time a drawn model matches its cue.
pub struct ScriptedSurface {
    tx: Sender<Message>,
    steps: Vec<Step>,
    theme: Theme,
    states: Vec<WorkflowState>,
    views: Vec<String>,
    max_frame: usize,
}

impl ScriptedSurface {
    pub fn new(tx: Sender<Message>) -> Self {
        Self {
            tx,
            steps: Vec::new(),
            theme: Theme::plain("Gemini"),
            states: Vec::new(),
            views: Vec::new(),
            max_frame: 0,
        }
    }

    /// Send `input` the first time `cue` is drawn.
    pub fn on(self, cue: Cue, input: Input) -> Self {
        self.on_frame(cue, 0, input)
    }

    /// Send `input` once `cue` is drawn at spinner frame `min_frame` or later.
    pub fn on_frame(mut self, cue: Cue, min_frame: usize, input: Input) -> Self {
        self.steps.push(Step {
            cue,
            min_frame,
            input,
            fired: false,
        });
        self
    }

    pub fn visited(&self, state: WorkflowState) -> bool {
        self.states.contains(&state)
    }

    pub fn last_view(&self) -> &str {
        self.views.last().map(String::as_str).unwrap_or_default()
    }

    pub fn max_frame(&self) -> usize {
        self.max_frame
    }
}

impl Surface for ScriptedSurface {
    fn draw(&mut self, model: &WorkflowModel, frame: usize) -> Result<()> {
        if self.states.last() != Some(&model.state) {
            self.states.push(model.state);
        }
        self.views.push(render(model, &self.theme, frame));
        self.max_frame = self.max_frame.max(frame);
        for step in &mut self.steps {
            if !step.fired && frame >= step.min_frame && step.cue.matches(model) {
                step.fired = true;
                self.tx
                    .send(Message::UserInput(step.input))
                    .context("send scripted input")?;
            }
        }
        Ok(())
    }
}

/// Throwaway git repository with a committer identity configured.
#[cfg(feature = "test-support")]
pub struct TestRepo {
    dir: tempfile::TempDir,
}

#[cfg(feature = "test-support")]
impl TestRepo {
    pub fn init() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        let repo = Self { dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.name", "gemmit tests"])?;
        repo.git(&["config", "user.email", "tests@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel` (creating parent dirs) without staging it.
    pub fn write(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Write and stage `rel`.
    pub fn stage(&self, rel: &str, contents: &str) -> Result<()> {
        self.write(rel, contents)?;
        self.git(&["add", "--", rel])?;
        Ok(())
    }

    /// Run git in the repository and return stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub fn commit_count(&self) -> usize {
        self.git(&["rev-list", "--count", "HEAD"])
            .ok()
            .and_then(|out| out.trim().parse().ok())
            .unwrap_or(0)
    }
}
