//! Interactive terminal: raw mode, key decoding and in-place redraws.

use std::io::{self, Write};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveToColumn, MoveUp, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType, disable_raw_mode, enable_raw_mode};
use crossterm::{execute, queue};
use tracing::{debug, warn};

use crate::core::machine::WorkflowModel;
use crate::core::message::Message;
use crate::core::types::Input;
use crate::driver::{Driver, Surface};
use crate::render::{Theme, render};
use crate::tasks::CancelToken;

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Raw mode with a hidden cursor, restored on drop.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        if let Err(err) = execute!(io::stdout(), Hide) {
            warn!(err = %err, "failed to hide cursor");
        }
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show);
        if let Err(err) = disable_raw_mode() {
            warn!(err = %err, "failed to restore terminal mode");
        }
    }
}

/// Decode a key event. Only presses count; keys with no meaning yield `None`.
pub fn map_key(key: KeyEvent) -> Option<Input> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Input::Cancel),
        KeyCode::Esc | KeyCode::Char('q') => Some(Input::Cancel),
        KeyCode::Char('y' | 'Y') => Some(Input::Affirm),
        KeyCode::Char(_) | KeyCode::Enter => Some(Input::Decline),
        _ => None,
    }
}

/// Forward decoded keys into the driver queue until `stop` fires or the queue closes.
pub fn spawn_key_reader(tx: Sender<Message>, stop: CancelToken) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("gemmit-keys".to_string())
        .spawn(move || {
            while !stop.is_cancelled() {
                match event::poll(KEY_POLL_INTERVAL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => {
                        warn!(err = %err, "terminal event poll failed");
                        break;
                    }
                }
                let key = match event::read() {
                    Ok(Event::Key(key)) => key,
                    Ok(_) => continue,
                    Err(err) => {
                        warn!(err = %err, "terminal event read failed");
                        break;
                    }
                };
                if let Some(input) = map_key(key) {
                    debug!(?input, "key");
                    if tx.send(Message::UserInput(input)).is_err() {
                        break;
                    }
                }
            }
        })
        .context("spawn key reader")
}

/// Surface that redraws the current view in place.
pub struct TerminalSurface<W: Write> {
    out: W,
    theme: Theme,
    width: Option<u16>,
    last_view: String,
    last_rows: u16,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out,
            theme,
            width: None,
            last_view: String::new(),
            last_rows: 0,
        }
    }

    /// Use a fixed column count instead of asking the terminal.
    pub fn with_width(mut self, columns: u16) -> Self {
        self.width = Some(columns);
        self
    }

    fn columns(&self) -> u16 {
        self.width
            .or_else(|| terminal::size().ok().map(|(cols, _)| cols))
            .unwrap_or(u16::MAX)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn draw(&mut self, model: &WorkflowModel, frame: usize) -> Result<()> {
        let view = render(model, &self.theme, frame);
        if view == self.last_view {
            return Ok(());
        }
        queue!(self.out, MoveToColumn(0)).context("move cursor")?;
        if self.last_rows > 0 {
            queue!(self.out, MoveUp(self.last_rows)).context("move cursor")?;
        }
        queue!(self.out, Clear(ClearType::FromCursorDown)).context("clear view")?;
        // Raw mode does not translate newlines.
        self.out
            .write_all(view.replace('\n', "\r\n").as_bytes())
            .context("write view")?;
        self.out.flush().context("flush terminal")?;
        // Measured at draw time; a resize between draws can still leave stale rows.
        self.last_rows = rows_above_cursor(&view, self.columns());
        self.last_view = view;
        Ok(())
    }
}

/// Terminal rows between the first row of `view` and the cursor left after it,
/// counting lines the terminal soft-wraps at `columns`.
fn rows_above_cursor(view: &str, columns: u16) -> u16 {
    let columns = usize::from(columns.max(1));
    let rows: usize = view
        .split('\n')
        .map(|line| display_width(line).div_ceil(columns).max(1))
        .sum();
    u16::try_from(rows.saturating_sub(1)).unwrap_or(u16::MAX)
}

/// Approximate column width of `line`, skipping ANSI escape sequences.
fn display_width(line: &str) -> usize {
    let mut width = 0;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            // CSI: ESC [ params final, with the final byte in @..=~.
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        width += char_width(c);
    }
    width
}

fn char_width(c: char) -> usize {
    match u32::from(c) {
        0x0300..=0x036F | 0x200B..=0x200F | 0xFE00..=0xFE0F => 0,
        0x1100..=0x115F
        | 0x2600..=0x27BF
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F000..=0x10FFFF => 2,
        n if n < 0x20 => 0,
        _ => 1,
    }
}

/// Run `driver` against the controlling terminal.
pub fn run_interactive(driver: Driver, theme: Theme) -> Result<WorkflowModel> {
    let _raw = RawModeGuard::enable()?;
    let stop = CancelToken::new();
    let reader = spawn_key_reader(driver.sender(), stop.clone())?;
    let mut surface = TerminalSurface::new(io::stdout(), theme);
    let result = driver.run(&mut surface);
    stop.cancel();
    if reader.join().is_err() {
        warn!("key reader thread panicked");
    }
    result
}
