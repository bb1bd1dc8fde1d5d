//! Terminal backend abstraction and crossterm implementation.
//!
//! `TerminalCapabilities` (scroll region support, among others) is queried
//! once at startup and consumed by the render engine to decide whether a
//! scroll delta can use the hardware scroll region or must fall back to a
//! full repaint.

use anyhow::Result;
use crossterm::{
    cursor::Hide,
    cursor::Show,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
        size,
    },
};
use std::io::{Write, stdout};

pub mod capabilities;
pub use capabilities::TerminalCapabilities;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
}

/// Mouse capability as a triple option: off, on, on-plus (wheel
/// scroll direction inverted relative to plain "on").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    Off,
    On,
    OnPlus,
}

/// Current terminal column/row size, queried on demand after a WINCH.
pub fn terminal_size() -> Result<(u16, u16)> {
    Ok(size()?)
}

/// Ring the terminal bell.
pub fn bell() -> Result<()> {
    write!(stdout(), "\x07")?;
    stdout().flush()?;
    Ok(())
}

/// Toggle mouse reporting on entry/exit: `ESC [ ? 1000 h` /
/// `ESC [ ? 1006 h` on entry, the reciprocal disable on exit.
pub fn set_mouse_capture(mode: MouseMode) -> Result<()> {
    match mode {
        MouseMode::Off => execute!(stdout(), DisableMouseCapture)?,
        MouseMode::On | MouseMode::OnPlus => execute!(stdout(), EnableMouseCapture)?,
    }
    Ok(())
}

pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}
