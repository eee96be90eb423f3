//! Interactive terminal panels.
//!
//! Panels are [`Component`]s: they turn keys into [`Action`]s and render to
//! a list of lines. [`run_panel`] owns the terminal while a panel is shown,
//! feeds it keys and hands it the result of its background load.

pub mod cost_panel;
pub mod frame;
pub mod picker;
pub mod usage_panel;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use piusage_core::Theme;
use tokio::task::JoinHandle;
use tracing::debug;

pub use cost_panel::CostPanel;
pub use picker::AccountPicker;
pub use usage_panel::UsagePanel;

/// How often the loop wakes up to check on the background load.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Width used when the terminal size is unknown.
const FALLBACK_WIDTH: u16 = 80;

/// Widest a panel is drawn.
pub const MAX_PANEL_WIDTH: usize = 100;

// ============================================================================
// Component Model
// ============================================================================

/// Keys the panels understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Backspace,
    Tab,
    Char(char),
}

impl Key {
    /// Maps a terminal key event. Ctrl-C is Escape.
    pub fn from_event(event: KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(event.code, KeyCode::Char('c')).then_some(Self::Escape);
        }
        Some(match event.code {
            KeyCode::Up => Self::Up,
            KeyCode::Down => Self::Down,
            KeyCode::Left => Self::Left,
            KeyCode::Right => Self::Right,
            KeyCode::Enter => Self::Enter,
            KeyCode::Esc => Self::Escape,
            KeyCode::Backspace => Self::Backspace,
            KeyCode::Tab => Self::Tab,
            KeyCode::Char(c) => Self::Char(c),
            _ => return None,
        })
    }

    /// Up, also `k`.
    pub fn is_up(self) -> bool {
        matches!(self, Self::Up | Self::Char('k'))
    }

    /// Down, also `j`.
    pub fn is_down(self) -> bool {
        matches!(self, Self::Down | Self::Char('j'))
    }

    /// Escape, also `q`.
    pub fn is_close(self) -> bool {
        matches!(self, Self::Escape | Self::Char('q'))
    }
}

/// What a panel wants after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Keep going.
    None,
    /// Leave the panel.
    Close,
    /// Make `key` the active credential for `prefix`, then leave.
    Switch { prefix: String, key: String },
    /// Delete the session logs of `provider`, then reload.
    DeleteLogs { provider: String },
}

/// Panel lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// Waiting for the background load.
    Loading,
    /// Data shown, accepting input.
    Ready,
    /// A switch was requested; input is ignored.
    Switching,
    /// Done.
    Closed,
}

/// An interactive panel.
pub trait Component {
    /// Applies a key press.
    fn handle_key(&mut self, key: Key) -> Action;

    /// Renders the panel at `width` columns. Must not mutate state.
    fn render(&self, width: usize, theme: &dyn Theme) -> Vec<String>;
}

/// A component fed by one background load.
pub trait Panel: Component {
    /// Result of the load.
    type Data: Send + 'static;

    /// Hands over the loaded data and moves the panel to `Ready`.
    fn loaded(&mut self, data: Self::Data);

    /// Current state.
    fn state(&self) -> PanelState;
}

// ============================================================================
// Terminal Loop
// ============================================================================

/// Raw mode and alternate screen, restored on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

fn panel_width() -> usize {
    let (cols, _) = terminal::size().unwrap_or((FALLBACK_WIDTH, 0));
    usize::from(cols).min(MAX_PANEL_WIDTH)
}

fn draw(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    out.write_all(lines.join("\r\n").as_bytes())?;
    out.flush()
}

/// Shows `panel` until it closes or asks for a switch.
///
/// `load` runs in the background; the panel renders its loading state until
/// the result arrives. Actions for which `reload` returns a task stay inside
/// the panel: the task's result is handed to the panel like the first load.
/// Without a terminal on stdout the loop is skipped: the load is awaited and
/// the panel is printed once.
pub async fn run_panel<P: Panel>(
    panel: &mut P,
    load: JoinHandle<P::Data>,
    mut reload: impl FnMut(&Action) -> Option<JoinHandle<P::Data>>,
    interactive: bool,
    theme: &dyn Theme,
) -> Result<Action> {
    if !interactive {
        panel.loaded(load.await?);
        for line in panel.render(panel_width(), theme) {
            println!("{line}");
        }
        return Ok(Action::Close);
    }

    let guard = TerminalGuard::enter()?;
    let mut out = io::stdout();
    let mut pending = Some(load);
    let mut dirty = true;

    let action = loop {
        if pending.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = pending.take() {
                panel.loaded(handle.await?);
                dirty = true;
            }
        }

        if dirty {
            draw(&mut out, &panel.render(panel_width(), theme))?;
            dirty = false;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        match event::read()? {
            Event::Key(event) => {
                let Some(key) = Key::from_event(event) else { continue };
                match panel.handle_key(key) {
                    Action::None => dirty = true,
                    action => match reload(&action) {
                        Some(handle) => {
                            debug!(?action, "Reloading panel");
                            pending = Some(handle);
                            dirty = true;
                        }
                        None => break action,
                    },
                }
            }
            Event::Resize(..) => dirty = true,
            _ => {}
        }
    };

    if matches!(action, Action::Switch { .. }) {
        draw(&mut out, &panel.render(panel_width(), theme))?;
    }
    drop(guard);
    debug!(?action, state = ?panel.state(), "Panel closed");
    Ok(action)
}
