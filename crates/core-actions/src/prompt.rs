//! The multi-character prompt FSM (spec §4.5): a small state machine layered
//! above `core_keymap::Dispatcher` that accumulates a run of bytes — a
//! digit count, a search pattern, an option letter, a mark name, a filename —
//! until the prompt completes, is cancelled by erase-to-empty, or is
//! aborted outright with `^G`. Grounded on the teacher's
//! `core-actions::dispatcher` mode machinery (`mode.rs`, `command_parser.rs`),
//! generalized here from editor modes to pager prompt modes.

/// Which multi-character prompt is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Digit,
    OptToggle,
    Search,
    Filter,
    Bracket,
    SetMark,
    ClrMark,
    GoMark,
    Pipe,
    Examine,
    Shell,
    FirstCmd,
}

/// Search/filter leading-modifier flags, accumulated before the pattern
/// text itself (spec §4.5: `!`, `*`, `@`, `^N`, `^E`, `^F`, `^K`, `^R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchModifiers {
    pub invert: bool,
    pub all_files: bool,
    pub start_of_file: bool,
    pub no_move: bool,
    pub no_regex: bool,
    pub highlight_only: bool,
    pub filter_out: bool,
    pub wrap_no_ignore_case: bool,
}

/// Why a prompt ended. `Completed` carries the accumulated text (or numeric
/// count, for `Digit` mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Completed(String),
    Cancelled,
    Aborted,
}

/// One small input FSM instance: lives only while a multi-character prompt
/// is being typed. The byte dispatcher keeps resolving literal command keys
/// in parallel; `ActionDispatcher` decides which of the two to feed a byte
/// to based on whether a `Prompt` is currently open.
pub struct Prompt {
    mode: PromptMode,
    buf: String,
    pub modifiers: SearchModifiers,
    history_hook: Option<fn(PromptMode, &str)>,
}

impl Prompt {
    pub fn new(mode: PromptMode) -> Self {
        Self {
            mode,
            buf: String::new(),
            modifiers: SearchModifiers::default(),
            history_hook: None,
        }
    }

    pub fn with_history_hook(mut self, hook: fn(PromptMode, &str)) -> Self {
        self.history_hook = Some(hook);
        self
    }

    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    pub fn buffer(&self) -> &str {
        &self.buf
    }

    /// Feed one decoded input character. Kill (`^U`) clears the buffer;
    /// erase (backspace) drops the last character and, if the buffer becomes
    /// empty, cancels the prompt; `^G` aborts unconditionally; `\n`/`\r`
    /// completes it. `Bracket` mode completes after exactly two characters.
    pub fn feed(&mut self, c: char) -> Option<PromptOutcome> {
        match c {
            '\u{7}' => return Some(PromptOutcome::Aborted),
            '\u{15}' => {
                self.buf.clear();
                return None;
            }
            '\u{8}' | '\u{7f}' => {
                if self.buf.pop().is_none() {
                    return Some(PromptOutcome::Cancelled);
                }
                return None;
            }
            '\n' | '\r' => {
                let out = self.buf.clone();
                if let Some(hook) = self.history_hook {
                    hook(self.mode, &out);
                }
                return Some(PromptOutcome::Completed(out));
            }
            _ => {}
        }
        if (self.mode == PromptMode::Search || self.mode == PromptMode::Filter) && self.buf.is_empty() {
            match c {
                '!' => {
                    self.modifiers.invert = true;
                    return None;
                }
                '*' => {
                    self.modifiers.all_files = true;
                    return None;
                }
                '@' => {
                    self.modifiers.start_of_file = true;
                    return None;
                }
                '\u{0e}' => {
                    // ^N
                    self.modifiers.no_move = true;
                    return None;
                }
                '\u{05}' => {
                    // ^E
                    self.modifiers.no_regex = true;
                    return None;
                }
                '\u{06}' => {
                    // ^F
                    self.modifiers.highlight_only = true;
                    return None;
                }
                '\u{0b}' => {
                    // ^K
                    self.modifiers.filter_out = true;
                    return None;
                }
                '\u{12}' => {
                    // ^R
                    self.modifiers.wrap_no_ignore_case = true;
                    return None;
                }
                _ => {}
            }
        }
        if self.mode == PromptMode::Bracket && self.buf.chars().count() >= 1 {
            self.buf.push(c);
            let out = self.buf.clone();
            return Some(PromptOutcome::Completed(out));
        }
        self.buf.push(c);
        None
    }
}
