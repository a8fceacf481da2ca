//! Driver Module - Event-loop bridge to a live terminal
//!
//! Connects a [`Runtime`] to the terminal it runs in: raw mode and alternate
//! screen with drop-safe restore, event polling bounded by the runtime's
//! next deadline, and conversion of crossterm events into runtime
//! dispatches. Keys nobody consumes fall back to document scrolling, the
//! way a browser scrolls an idle page.
//!
//! # Example
//!
//! ```ignore
//! use glimmer_tui::runtime::{driver, Runtime};
//!
//! let runtime = Runtime::default();
//! driver::run(&runtime, |_rt| {
//!     // redraw here; return Flow::Exit to stop
//!     driver::Flow::Continue
//! })?;
//! ```

use std::io::{self, stdout};
use std::time::{Duration, Instant};

use crossterm::cursor;
use crossterm::event::{
    poll, read, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
    KeyEvent as CrosstermKeyEvent, KeyEventKind, KeyModifiers, MouseEvent as CrosstermMouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size, EnterAlternateScreen, LeaveAlternateScreen,
};
use spark_signals::flush_sync;

use super::Runtime;
use crate::types::{KeyState, KeyboardEvent, Modifiers};
use crate::viewport::{LINE_SCROLL, WHEEL_SCROLL};

/// Poll bound when the runtime has nothing scheduled.
const IDLE_POLL: Duration = Duration::from_millis(100);

// =============================================================================
// TERMINAL GUARD
// =============================================================================

/// Raw mode + alternate screen + mouse capture, restored on drop.
///
/// Restore also runs on unwind, so a panic never leaves the terminal raw.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(
            stdout(),
            EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;
        Ok(Self { active: true })
    }

    /// Restore the terminal now and report any error.
    pub fn exit(mut self) -> io::Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(
            stdout(),
            DisableMouseCapture,
            cursor::Show,
            LeaveAlternateScreen
        )?;
        disable_raw_mode()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// =============================================================================
// EVENT CONVERSION
// =============================================================================

/// Convert a crossterm KeyEvent to a [`KeyboardEvent`].
///
/// Shift+Tab arrives from most terminals as `BackTab`; it is normalized to
/// a shifted `Tab` so handlers only ever match one spelling.
pub fn convert_key_event(event: CrosstermKeyEvent) -> KeyboardEvent {
    let key = match event.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab | KeyCode::BackTab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Insert => "Insert".to_string(),
        _ => String::new(),
    };

    let mut modifiers = convert_modifiers(event.modifiers);
    if event.code == KeyCode::BackTab {
        modifiers.shift = true;
    }

    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };

    KeyboardEvent {
        key,
        modifiers,
        state,
    }
}

/// Convert crossterm KeyModifiers to our Modifiers
fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: false, // Not exposed by crossterm
    }
}

/// Ctrl+C always stops the loop, consumed or not.
fn is_interrupt(event: &KeyboardEvent) -> bool {
    event.key == "c" && event.modifiers.ctrl && event.state != KeyState::Release
}

/// Unconsumed navigation keys scroll the document.
///
/// Returns whether the key was a scrolling key.
fn apply_default_scrolling(runtime: &Runtime, event: &KeyboardEvent) -> bool {
    if event.state == KeyState::Release {
        return false;
    }
    let viewport = runtime.viewport();
    match event.key.as_str() {
        "ArrowDown" => viewport.scroll_by(LINE_SCROLL),
        "ArrowUp" => viewport.scroll_by(-LINE_SCROLL),
        "PageDown" => viewport.scroll_by(viewport.page_scroll()),
        "PageUp" => viewport.scroll_by(-viewport.page_scroll()),
        "Home" => viewport.scroll_to(0.0),
        "End" => viewport.scroll_to(viewport.max_scroll()),
        _ => return false,
    };
    true
}

fn dispatch_mouse(runtime: &Runtime, event: CrosstermMouseEvent) {
    match event.kind {
        MouseEventKind::ScrollDown => {
            runtime.dispatch_scroll(WHEEL_SCROLL);
        }
        MouseEventKind::ScrollUp => {
            runtime.dispatch_scroll(-WHEEL_SCROLL);
        }
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            runtime.dispatch_pointer(event.column, event.row);
        }
        _ => {}
    }
}

// =============================================================================
// EVENT LOOP
// =============================================================================

/// What the loop hook wants to happen next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Drive a runtime against the live terminal until the hook exits (or the
/// user presses Ctrl+C).
///
/// Each iteration ticks the runtime clock, flushes deferred signal effects,
/// invokes the hook (draw here), then sleeps in `poll` until the next
/// deadline or an input event. The terminal is restored on every exit path.
pub fn run(runtime: &Runtime, mut hook: impl FnMut(&Runtime) -> Flow) -> io::Result<()> {
    let guard = TerminalGuard::enter()?;

    let (cols, rows) = size()?;
    runtime.dispatch_resize(cols, rows);
    log::debug!("driver started at {cols}x{rows}");

    loop {
        runtime.tick(Instant::now());
        flush_sync();
        if hook(runtime) == Flow::Exit {
            break;
        }

        let timeout = runtime
            .next_deadline(Instant::now())
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);
        if poll(timeout)? {
            match read()? {
                CrosstermEvent::Key(key) => {
                    let event = convert_key_event(key);
                    if is_interrupt(&event) {
                        break;
                    }
                    if !runtime.dispatch_key(&event) {
                        apply_default_scrolling(runtime, &event);
                    }
                }
                CrosstermEvent::Mouse(mouse) => dispatch_mouse(runtime, mouse),
                CrosstermEvent::Resize(w, h) => runtime.dispatch_resize(w, h),
                _ => {}
            }
            flush_sync();
        }
    }

    guard.exit()
}

// =============================================================================
// Tests
// =============================================================================
