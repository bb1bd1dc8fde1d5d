//! Terminal writer: batches the primitive cursor/clear/print operations a
//! repaint wants to issue and flushes them in one pass.
//!
//! Commands preserve ordering and positions are absolute (0,0) origin; the
//! caller is responsible for bounds. The writer owns no state across frames.

use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{Write, stdout};

#[derive(Debug)]
pub enum Command {
    MoveTo(u16, u16),
    ClearLine(u16, u16), // (x,y) start; caller emits a preceding MoveTo(0,y)
    Print(String),
}

#[derive(Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self { cmds: Vec::new() }
    }
    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::MoveTo(x, y));
    }
    pub fn clear_line(&mut self, x: u16, y: u16) {
        self.cmds.push(Command::ClearLine(x, y));
    }
    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }
    pub fn flush(self) -> Result<()> {
        let mut out = stdout();
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => {
                    queue!(out, MoveTo(x, y))?;
                }
                Command::ClearLine(_, _) => {
                    queue!(out, Clear(ClearType::CurrentLine))?;
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}
