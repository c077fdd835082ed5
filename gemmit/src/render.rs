//! Terminal views.
//!
//! [`render`] is a pure function of the model, a [`Theme`] and the spinner
//! frame. The terminal surface decides how the text reaches the screen.

use std::fmt::Write as _;

use crossterm::style::{Color, ContentStyle, Stylize};

use crate::core::machine::WorkflowModel;
use crate::core::types::{Completion, WorkflowState};

/// Braille "dot" spinner.
pub const SPINNER_FRAMES: [&str; 8] = ["⣾ ", "⣽ ", "⣻ ", "⢿ ", "⡿ ", "⣟ ", "⣯ ", "⣷ "];

/// Read-only rendering parameters, built once per run.
#[derive(Debug, Clone)]
pub struct Theme {
    pub title: ContentStyle,
    pub warning: ContentStyle,
    pub error: ContentStyle,
    pub success: ContentStyle,
    pub message: ContentStyle,
    pub prompt: ContentStyle,
    pub spinner: ContentStyle,
    pub spinner_frames: Vec<String>,
    /// Name of the generator shown above the suggestion.
    pub assistant: String,
}

impl Theme {
    pub fn new(color: bool, assistant: impl Into<String>) -> Self {
        if !color {
            return Self::plain(assistant);
        }
        Self {
            title: ContentStyle::new().with(Color::AnsiValue(99)).bold(),
            warning: ContentStyle::new().with(Color::AnsiValue(214)).bold(),
            error: ContentStyle::new().with(Color::AnsiValue(196)).bold(),
            success: ContentStyle::new().with(Color::AnsiValue(42)).bold(),
            message: ContentStyle::new().with(Color::AnsiValue(229)),
            prompt: ContentStyle::new().with(Color::AnsiValue(86)),
            spinner: ContentStyle::new().with(Color::AnsiValue(205)),
            ..Self::plain(assistant)
        }
    }

    /// Theme without any escape sequences.
    pub fn plain(assistant: impl Into<String>) -> Self {
        Self {
            title: ContentStyle::new(),
            warning: ContentStyle::new(),
            error: ContentStyle::new(),
            success: ContentStyle::new(),
            message: ContentStyle::new(),
            prompt: ContentStyle::new(),
            spinner: ContentStyle::new(),
            spinner_frames: SPINNER_FRAMES.iter().map(|f| f.to_string()).collect(),
            assistant: assistant.into(),
        }
    }

    fn spinner_frame(&self, frame: usize) -> &str {
        if self.spinner_frames.is_empty() {
            return "";
        }
        &self.spinner_frames[frame % self.spinner_frames.len()]
    }
}

/// Render the view for `model`.
///
/// Lines are separated by `\n`; the terminal surface translates for raw mode.
pub fn render(model: &WorkflowModel, theme: &Theme, frame: usize) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_view(&mut out, model, theme, frame);
    out
}

fn write_view(
    out: &mut String,
    model: &WorkflowModel,
    theme: &Theme,
    frame: usize,
) -> std::fmt::Result {
    match model.state {
        WorkflowState::Loading => {
            busy_line(out, theme, frame, "Thinking...")?;
        }
        WorkflowState::Warning => {
            write!(out, "\n{}\n\n", theme.warning.apply("⚠️  WARNING"))?;
            writeln!(
                out,
                "{}",
                theme
                    .warning
                    .apply("The following directories are in your staged changes:")
            )?;
            for path in &model.risky_paths {
                writeln!(out, "{}", theme.error.apply(format!("  • {path}")))?;
            }
            write!(
                out,
                "\n{}\n\n",
                theme
                    .warning
                    .apply("These directories should typically not be committed!")
            )?;
            write!(out, "{}", theme.prompt.apply("Continue anyway? (y/N): "))?;
        }
        WorkflowState::Confirm => {
            write!(
                out,
                "\n{}\n\n",
                theme
                    .title
                    .apply(format!("✨ {} suggested:", theme.assistant))
            )?;
            let message = model.candidate_message.as_deref().unwrap_or_default();
            write!(out, "{}\n\n", theme.message.apply(message))?;
            if !model.excluded_artifacts.is_empty() {
                write!(
                    out,
                    "{}\n\n",
                    theme.warning.apply(format!(
                        "Not shown to {}: {}",
                        theme.assistant,
                        model.excluded_artifacts.join(", ")
                    ))
                )?;
            }
            write!(
                out,
                "{}",
                theme.prompt.apply("Commit with this message? (y/N): ")
            )?;
        }
        WorkflowState::Committing => {
            busy_line(out, theme, frame, "Committing...")?;
        }
        WorkflowState::Done(Completion::Committed) => {
            write!(
                out,
                "\n{}\n\n",
                theme.success.apply("✅ Committed successfully!")
            )?;
        }
        WorkflowState::Done(Completion::Cancelled) => {
            write!(out, "\n{}\n\n", theme.warning.apply("🚫 commit canceled"))?;
        }
        WorkflowState::Error => {
            let reason = model
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown failure".to_string());
            write!(
                out,
                "\n{}\n\n",
                theme.error.apply(format!("❌ Error: {reason}"))
            )?;
        }
    }
    Ok(())
}

fn busy_line(out: &mut String, theme: &Theme, frame: usize, label: &str) -> std::fmt::Result {
    write!(
        out,
        "\n {} {}\n\n",
        theme.spinner.apply(theme.spinner_frame(frame)),
        theme.title.apply(label)
    )
}
