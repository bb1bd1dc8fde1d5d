//! The process context: composes the block cache, line renderer, screen
//! position table, line-number cache, option store, and action dispatcher
//! into the navigation primitives (`forward`, `backward`, `jump_to_offset`,
//! `jump_to_line_number`, `search`) and the command loop that recomposes
//! them on every keystroke. Nothing below this crate knows about any of
//! the others; this is the one place that does.

pub mod line_io;
pub mod linenum_query;

use core_actions::{ActionDispatcher, CompiledSearch, DispatchEvent, NavCommand, SearchModifiers};
use core_cache::{CacheError, CacheResult, FileState, IfileList, MarkTable};
use core_config::OptionStore;
use core_keymap::Dispatcher as KeyDispatcher;
use core_linenum::LineNumCache;
use core_render::scheduler::{RenderDelta, RenderScheduler};
use core_render::status::{build_status, StatusContext};
use core_render::viewport::{DisplayRow, ScreenPosition};
use core_text::render::{render_line, RenderConfig};

pub use linenum_query::{find_line_number, find_position, LineNumberLookup};

/// Everything the command loop needs in order to act on one resolved
/// `NavCommand`: the open stream, the indexes built over it, and the
/// screen state those indexes feed.
pub struct PagerContext {
    pub file: FileState,
    pub ifiles: IfileList,
    pub marks: MarkTable,
    pub linenum: LineNumCache,
    pub options: OptionStore,
    pub screen: ScreenPosition,
    pub scheduler: RenderScheduler,
    pub dispatcher: ActionDispatcher,
    pub render_cfg: RenderConfig,
    /// The current top-of-screen file position; `screen` is rebuilt from
    /// here on every repaint.
    pub top: u64,
    /// The pattern and modifiers from the most recent search, reused by
    /// `RepeatSearch`.
    last_search: Option<(String, SearchModifiers)>,
    /// A transient status-line message (error, search result) that
    /// overrides the default summary until the next command clears it.
    pub message: Option<String>,
    pub quit_code: Option<u8>,
}

/// What a single applied command asks the REPL to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Repaint,
    Quit,
}

impl PagerContext {
    pub fn new(
        file: FileState,
        ifiles: IfileList,
        options: OptionStore,
        keymap: KeyDispatcher,
        width: u16,
    ) -> Self {
        Self {
            file,
            ifiles,
            marks: MarkTable::new(),
            linenum: LineNumCache::default(),
            options,
            screen: ScreenPosition::new(width),
            scheduler: RenderScheduler::default(),
            dispatcher: ActionDispatcher::new(keymap),
            render_cfg: RenderConfig { max_cols: width, ..RenderConfig::default() },
            top: 0,
            last_search: None,
            message: None,
            quit_code: None,
        }
    }

    /// Build `height` display rows starting at `from`, advancing through the
    /// file one raw line at a time. Stops early at end-of-stream; the
    /// returned vector may hold fewer than `height` rows.
    fn rows_forward(&mut self, from: u64, height: usize) -> CacheResult<Vec<DisplayRow>> {
        let mut rows = Vec::with_capacity(height);
        let mut next_line_pos = from;
        // When a logical line is wider than the screen and wrapping (not
        // chopping), one raw line spans several display rows; `carry` holds
        // the rest of that line's bytes across loop iterations so a
        // continuation row resumes from `rendered.consumed` instead of
        // re-reading (and re-rendering from column 0) the whole raw line.
        let mut carry: Option<(Vec<u8>, usize, u64, u64)> = None;
        for _ in 0..height {
            let (raw, raw_offset, raw_file_start, line_end) = if let Some(c) = carry.take() {
                c
            } else {
                match line_io::read_line_forward(&mut self.file, next_line_pos)? {
                    Some((raw, end)) => (raw, 0usize, next_line_pos, end),
                    None => break,
                }
            };

            let rendered = render_line(&raw[raw_offset..], &self.render_cfg);
            let row_start = raw_file_start + raw_offset as u64;
            let line_number = if raw_offset == 0 {
                match find_line_number(&mut self.file, &mut self.linenum, raw_file_start)? {
                    LineNumberLookup::Found(n) => Some(n),
                    LineNumberLookup::TimedOut => None,
                }
            } else {
                // Continuation rows of a wrapped line share the first row's
                // line number; only the first row looks it up.
                None
            };

            let consumed_abs = raw_offset + rendered.consumed;
            let wraps_further =
                !rendered.ended_in_newline && !self.render_cfg.chop_long_lines && consumed_abs < raw.len();

            rows.push(DisplayRow { start: row_start, end: line_end, line_number, rendered });

            if wraps_further {
                carry = Some((raw, consumed_abs, raw_file_start, line_end));
            } else {
                next_line_pos = line_end;
            }
        }
        Ok(rows)
    }

    /// Rebuild the screen from `top` using the given terminal height. Does
    /// not itself mark the scheduler; callers choose `Full` or `Scroll`
    /// depending on how far the new top is from the old one.
    fn repaint_from(&mut self, top: u64, height: usize) -> CacheResult<()> {
        self.top = top;
        let rows = self.rows_forward(top, height)?;
        self.screen.set_rows(rows);
        Ok(())
    }

    /// Advance the screen `n` lines forward: the new top is the start of
    /// the raw line `n` lines below the current top.
    pub fn forward(&mut self, n: u64, height: usize) -> CacheResult<()> {
        let mut pos = self.top;
        let mut rows_advanced = 0usize;
        for _ in 0..n {
            match line_io::read_line_forward(&mut self.file, pos)? {
                Some((_, end)) => {
                    pos = end;
                    rows_advanced += 1;
                }
                None => break,
            }
        }
        self.repaint_from(pos, height)?;
        self.scheduler.mark(RenderDelta::Scroll { old_top: 0, new_top: rows_advanced });
        Ok(())
    }

    /// Move the screen `n` lines backward: walk back `n` raw-line starts
    /// from the current top.
    pub fn backward(&mut self, n: u64, height: usize) -> CacheResult<()> {
        let mut pos = self.top;
        let mut rows_retreated = 0usize;
        for _ in 0..n {
            if pos == 0 {
                break;
            }
            pos = line_io::line_start_before(&mut self.file, pos)?;
            rows_retreated += 1;
        }
        self.repaint_from(pos, height)?;
        self.scheduler.mark(RenderDelta::Scroll { old_top: rows_retreated, new_top: 0 });
        Ok(())
    }

    /// Jump directly to a byte offset and repaint from there.
    pub fn jump_to_offset(&mut self, pos: u64, height: usize) -> CacheResult<()> {
        self.repaint_from(pos, height)?;
        self.scheduler.mark(RenderDelta::Full);
        Ok(())
    }

    /// Jump to the start of a 1-based line number and repaint from there.
    pub fn jump_to_line_number(&mut self, line: u64, height: usize) -> CacheResult<LineNumberLookup> {
        let found = find_position(&mut self.file, &mut self.linenum, line)?;
        if let LineNumberLookup::Found(pos) = found {
            self.repaint_from(pos, height)?;
            self.scheduler.mark(RenderDelta::Full);
        }
        Ok(found)
    }

    /// Search forward (or backward) from the current top for `pattern`,
    /// honoring `modifiers`; `ignore_case` reflects the live `-i`/`-I`
    /// option. On a hit, repaints with the match line as the new top.
    pub fn search(
        &mut self,
        pattern: &str,
        modifiers: SearchModifiers,
        reverse: bool,
        ignore_case: bool,
        height: usize,
    ) -> CacheResult<bool> {
        let compiled = CompiledSearch::compile(pattern, modifiers, ignore_case)
            .map_err(|e| CacheError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())))?;
        self.last_search = Some((pattern.to_string(), modifiers));
        let mut pos = self.top;
        loop {
            let probe_pos = if reverse {
                if pos == 0 {
                    return Ok(false);
                }
                line_io::line_start_before(&mut self.file, pos)?
            } else {
                pos
            };
            let Some((raw, end)) = line_io::read_line_forward(&mut self.file, probe_pos)? else {
                return Ok(false);
            };
            let text = String::from_utf8_lossy(&raw);
            if compiled.is_match(text.trim_end_matches(['\n', '\r'])) {
                self.repaint_from(probe_pos, height)?;
                self.scheduler.mark(RenderDelta::Full);
                return Ok(true);
            }
            pos = if reverse { probe_pos } else { end };
        }
    }

    /// Repeat the last search in the same (or, if `reverse`, opposite)
    /// direction it was originally issued.
    pub fn repeat_search(&mut self, reverse: bool, ignore_case: bool, height: usize) -> CacheResult<bool> {
        let Some((pattern, modifiers)) = self.last_search.clone() else {
            return Ok(false);
        };
        let effective_reverse = modifiers.invert ^ reverse;
        self.search(&pattern, modifiers, effective_reverse, ignore_case, height)
    }

    /// The pattern and modifiers of the most recent search, if any — used by
    /// the REPL to compute search-match highlight spans for the current
    /// frame without duplicating `last_search`'s bookkeeping.
    pub fn last_search(&self) -> Option<(&str, SearchModifiers)> {
        self.last_search.as_ref().map(|(p, m)| (p.as_str(), *m))
    }

    /// `-i`/`-I` is a triple option (off / on / on-unless-mixed-case isn't
    /// modeled here, just off/on), not a bool; read it accordingly.
    fn ignore_case_option(&self) -> bool {
        self.options
            .get('i')
            .ok()
            .and_then(|v| v.as_triple())
            .map(|t| t != core_config::Triple::Off)
            .unwrap_or(false)
    }

    /// Feed one resolved `NavCommand` through the context, applying
    /// whatever navigation, mark, or option-toggle effect it names.
    pub fn apply(&mut self, cmd: NavCommand, width: u16, height: usize) -> CacheResult<CommandOutcome> {
        self.message = None;
        self.render_cfg.max_cols = width;
        self.screen.set_width(width);
        self.render_cfg.chop_long_lines = self.options.get('S').ok().and_then(|v| v.as_bool()).unwrap_or(false);
        if let Some(core_config::Numeric::Int(n)) = self.options.get('x').ok().and_then(|v| v.as_numeric()) {
            self.render_cfg.tab_stop = n.max(1) as u16;
        }
        match cmd {
            NavCommand::Forward(n) => self.forward(n, height)?,
            NavCommand::Backward(n) => self.backward(n, height)?,
            NavCommand::ForwardScreen(n) => self.forward(n * height as u64, height)?,
            NavCommand::BackwardScreen(n) => self.backward(n * height as u64, height)?,
            NavCommand::ForwardHalfScreen(n) => self.forward(n * (height as u64 / 2).max(1), height)?,
            NavCommand::BackwardHalfScreen(n) => self.backward(n * (height as u64 / 2).max(1), height)?,
            NavCommand::GotoLine(line) => {
                if matches!(self.jump_to_line_number(line, height)?, LineNumberLookup::TimedOut) {
                    self.message = Some("line number search timed out".to_string());
                }
            }
            NavCommand::GotoStart => self.jump_to_offset(0, height)?,
            NavCommand::GotoEnd => {
                self.file.end_seek()?;
                let end = self.file.tell();
                let start = line_io::line_start_before(&mut self.file, end)?;
                self.jump_to_offset(start, height)?;
            }
            NavCommand::SearchForward { pattern, modifiers } => {
                let ignore_case = self.ignore_case_option();
                if !self.search(&pattern, modifiers, false, ignore_case, height)? {
                    self.message = Some("Pattern not found".to_string());
                }
            }
            NavCommand::SearchBackward { pattern, modifiers } => {
                let ignore_case = self.ignore_case_option();
                if !self.search(&pattern, modifiers, true, ignore_case, height)? {
                    self.message = Some("Pattern not found".to_string());
                }
            }
            NavCommand::RepeatSearch { reverse } => {
                let ignore_case = self.ignore_case_option();
                if !self.repeat_search(reverse, ignore_case, height)? {
                    self.message = Some("Pattern not found".to_string());
                }
            }
            NavCommand::SetMark(name) => {
                let idx = self.ifiles.current_index().unwrap_or(0);
                self.marks.set(name, idx, self.top);
            }
            NavCommand::ClearMark(name) => {
                self.marks.clear(name);
            }
            NavCommand::GoToMark(name) => {
                if let Some(mark) = self.marks.get(name) {
                    self.jump_to_offset(mark.pos, height)?;
                } else {
                    self.message = Some("mark not set".to_string());
                }
            }
            NavCommand::Quit(code) => {
                self.quit_code = code;
                return Ok(CommandOutcome::Quit);
            }
            NavCommand::Repaint => {
                self.repaint_from(self.top, height)?;
                self.scheduler.mark(RenderDelta::Full);
            }
            NavCommand::Status => return Ok(CommandOutcome::Repaint),
            NavCommand::Interrupt => {
                self.message = Some("Interrupt".to_string());
            }
            NavCommand::Filter { .. }
            | NavCommand::OptionToggle(_)
            | NavCommand::Pipe(_)
            | NavCommand::Examine(_)
            | NavCommand::Shell(_)
            | NavCommand::FirstCmd(_)
            | NavCommand::MouseSetMark
            | NavCommand::MouseScroll { .. }
            | NavCommand::Invalid => {
                // Shell escapes, filters, and alternate-file switches cross
                // process boundaries the REPL owns directly; option toggles
                // are applied by the REPL so it can react to REPAINT/
                // HILITE_REPAINT flags. This context resolves only the
                // purely navigational half of the command vocabulary.
            }
        }
        Ok(CommandOutcome::Continue)
    }

    /// Feed one raw input byte through the dispatcher, turning
    /// `DispatchEvent::Command` into an applied effect. Commands that cross
    /// a process boundary (shell escapes, alternate-file switches, option
    /// toggles) are handed back to the caller unapplied instead, since this
    /// context has no way to spawn a shell or reopen a file itself.
    pub fn feed_byte(&mut self, byte: u8, width: u16, height: usize) -> CacheResult<DispatchOutcome> {
        let event = self.dispatcher.feed(byte, &self.options);
        match event {
            DispatchEvent::Command(cmd) if needs_repl(&cmd) => Ok(DispatchOutcome::External(cmd)),
            DispatchEvent::Command(cmd) => Ok(DispatchOutcome::Applied(self.apply(cmd, width, height)?)),
            other => Ok(DispatchOutcome::Event(other)),
        }
    }

    /// Compose the status line text for the current screen state.
    pub fn status_line(&self, file_name: Option<&str>) -> String {
        let file_index = if self.ifiles.len() > 1 {
            self.ifiles.current_index().map(|i| (i + 1, self.ifiles.len()))
        } else {
            None
        };
        let line_range = match (self.screen.first_line_number(), self.screen.last_line_number()) {
            (Some(a), Some(b)) => Some((a, b, None)),
            _ => None,
        };
        let ctx = StatusContext {
            file_name,
            file_index,
            line_range,
            byte_percent: self.screen.percent(self.file.length()),
            at_eof: self.screen.is_at_eof(self.file.length()),
            prompt: None,
            message: self.message.as_deref(),
        };
        build_status(&ctx)
    }
}

/// What feeding one byte through the context produced.
#[derive(Debug)]
pub enum DispatchOutcome {
    Applied(CommandOutcome),
    Event(DispatchEvent),
    /// A command this context doesn't carry out itself; the REPL owns
    /// shell escapes, filters, alternate-file switches, and option toggles
    /// because they spawn processes, open new files, or react to
    /// REPAINT/HILITE_REPAINT flags the REPL tracks.
    External(NavCommand),
}

/// Whether `cmd` crosses a process boundary this context can't cross on its
/// own, and so must be handed back to the REPL unapplied.
fn needs_repl(cmd: &NavCommand) -> bool {
    matches!(
        cmd,
        NavCommand::Filter { .. }
            | NavCommand::OptionToggle(_)
            | NavCommand::Pipe(_)
            | NavCommand::Examine(_)
            | NavCommand::Shell(_)
            | NavCommand::FirstCmd(_)
            | NavCommand::MouseSetMark
            | NavCommand::MouseScroll { .. }
    )
}
