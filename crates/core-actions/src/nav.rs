//! Semantic navigation actions (spec §2: `forward`, `backward`,
//! `jump_to_offset`, `jump_to_line_number`, `search`) plus the smaller set of
//! prompt-driven commands (option toggle, marks, shell escapes). This is the
//! output vocabulary of `ActionDispatcher` — it names *what* the user asked
//! for without performing it; `core-model`'s command loop is what actually
//! walks the cache/renderer/line-number cache to carry it out.

use crate::prompt::{PromptMode, SearchModifiers};
use core_config::OptionStore;

/// Either half of an option name as typed at an `OptToggle` prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptName {
    Short(char),
    Long(String),
}

/// A fully decoded option-toggle request, ready for `core-model` to apply
/// against its `OptionStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptToggleRequest {
    pub name: OptName,
    /// `+`/`!` select ON_PLUS-style behavior (uppercase semantics); `-`/`_`
    /// select plain toggle/query; absence means "query" (bare letter).
    pub sign: Option<char>,
    /// Present when the prompt carried `=value` (numeric/string set form).
    pub value: Option<String>,
    /// `^P` was typed: suppress the post-toggle status message.
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    Forward(u64),
    Backward(u64),
    ForwardScreen(u64),
    BackwardScreen(u64),
    ForwardHalfScreen(u64),
    BackwardHalfScreen(u64),
    GotoLine(u64),
    GotoStart,
    GotoEnd,
    RepeatSearch { reverse: bool },
    SearchForward { pattern: String, modifiers: SearchModifiers },
    SearchBackward { pattern: String, modifiers: SearchModifiers },
    Filter { pattern: String, modifiers: SearchModifiers },
    OptionToggle(OptToggleRequest),
    SetMark(char),
    ClearMark(char),
    GoToMark(char),
    Pipe(String),
    Examine(String),
    Shell(String),
    FirstCmd(String),
    Quit(Option<u8>),
    Repaint,
    Status,
    Interrupt,
    MouseSetMark,
    MouseScroll { forward: bool, lines: u64 },
    Invalid,
}

use crate::action_ids::*;

/// Translate a resolved `core_keymap::Action::Named` id, plus any digit
/// count accumulated beforehand, into a `NavCommand`. Actions that open a
/// multi-character prompt instead return `None` — the caller opens the
/// prompt and waits for it to complete.
pub fn translate(action_id: u16, count: Option<u64>) -> Option<NavCommand> {
    let n = count.unwrap_or(1);
    Some(match action_id {
        A_F_LINE => NavCommand::Forward(n),
        A_B_LINE => NavCommand::Backward(n),
        A_F_SCREEN => NavCommand::ForwardScreen(n),
        A_B_SCREEN => NavCommand::BackwardScreen(n),
        A_F_HALF_SCREEN => NavCommand::ForwardHalfScreen(n),
        A_B_HALF_SCREEN => NavCommand::BackwardHalfScreen(n),
        A_GOTO_LINE => NavCommand::GotoLine(count.unwrap_or(1)),
        A_GOTO_START => NavCommand::GotoStart,
        A_GOTO_END => NavCommand::GotoEnd,
        A_REPEAT_SEARCH => NavCommand::RepeatSearch { reverse: false },
        A_REPEAT_SEARCH_REV => NavCommand::RepeatSearch { reverse: true },
        A_QUIT => NavCommand::Quit(count.map(|c| c as u8)),
        A_REPAINT => NavCommand::Repaint,
        A_STATUS => NavCommand::Status,
        A_INTERRUPT => NavCommand::Interrupt,
        // These open a multi-character prompt; the dispatcher handles them
        // before reaching `translate`.
        A_SEARCH_FORW | A_SEARCH_BACK | A_FILTER | A_OPT_TOGGLE | A_SETMARK | A_CLRMARK
        | A_GOMARK | A_PIPE | A_EXAMINE | A_SHELL | A_FIRSTCMD | A_BRACKET | A_DIGIT => return None,
        _ => NavCommand::Invalid,
    })
}

/// Which `PromptMode` a given action-id opens, for actions whose job is
/// only to start a multi-character prompt.
pub fn prompt_for_action(action_id: u16) -> Option<PromptMode> {
    Some(match action_id {
        A_SEARCH_FORW | A_SEARCH_BACK => PromptMode::Search,
        A_FILTER => PromptMode::Filter,
        A_OPT_TOGGLE => PromptMode::OptToggle,
        A_SETMARK => PromptMode::SetMark,
        A_CLRMARK => PromptMode::ClrMark,
        A_GOMARK => PromptMode::GoMark,
        A_PIPE => PromptMode::Pipe,
        A_EXAMINE => PromptMode::Examine,
        A_SHELL => PromptMode::Shell,
        A_FIRSTCMD => PromptMode::FirstCmd,
        A_BRACKET => PromptMode::Bracket,
        _ => return None,
    })
}

/// Parse a completed `OptToggle` prompt buffer: optional leading sign
/// (`+`/`!`/`-`/`_`), optional `^P` quiet marker, then either `--long-name`
/// or a single short letter, then an optional `=value`.
fn parse_opt_toggle(text: &str) -> OptToggleRequest {
    let mut chars = text.chars().peekable();
    let mut sign = None;
    let mut quiet = false;
    loop {
        match chars.peek() {
            Some('+') | Some('!') | Some('-') | Some('_') => {
                sign = chars.next();
            }
            Some('\u{10}') => {
                quiet = true;
                chars.next();
            }
            _ => break,
        }
    }
    let rest: String = chars.collect();
    let (name_part, value) = match rest.split_once('=') {
        Some((n, v)) => (n.to_string(), Some(v.to_string())),
        None => (rest, None),
    };
    let name = if let Some(long) = name_part.strip_prefix("--") {
        OptName::Long(long.to_string())
    } else {
        OptName::Short(name_part.chars().next().unwrap_or('\0'))
    };
    OptToggleRequest { name, sign, value, quiet }
}

/// Build the `NavCommand` a just-completed prompt represents. `search_case_insensitive`
/// reflects the live `-i`/`-I` option so a `search` prompt's regex compiles
/// with the right case sensitivity without this crate reaching into the
/// cache/renderer to ask.
pub fn finish_prompt(
    mode: PromptMode,
    text: &str,
    modifiers: SearchModifiers,
    _store: &OptionStore,
) -> NavCommand {
    match mode {
        PromptMode::Digit => text
            .parse::<u64>()
            .map(NavCommand::GotoLine)
            .unwrap_or(NavCommand::Invalid),
        PromptMode::Search => NavCommand::SearchForward {
            pattern: text.to_string(),
            modifiers,
        },
        PromptMode::Filter => NavCommand::Filter {
            pattern: text.to_string(),
            modifiers,
        },
        PromptMode::OptToggle => NavCommand::OptionToggle(parse_opt_toggle(text)),
        PromptMode::SetMark => NavCommand::SetMark(text.chars().next().unwrap_or('\0')),
        PromptMode::ClrMark => NavCommand::ClearMark(text.chars().next().unwrap_or('\0')),
        PromptMode::GoMark => NavCommand::GoToMark(text.chars().next().unwrap_or('\0')),
        PromptMode::Pipe => NavCommand::Pipe(text.to_string()),
        PromptMode::Examine => NavCommand::Examine(text.to_string()),
        PromptMode::Shell => NavCommand::Shell(text.to_string()),
        PromptMode::FirstCmd => NavCommand::FirstCmd(text.to_string()),
        PromptMode::Bracket => NavCommand::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_forward_line_defaults_count_to_one() {
        assert_eq!(translate(A_F_LINE, None), Some(NavCommand::Forward(1)));
    }

    #[test]
    fn translate_applies_accumulated_digit_count() {
        assert_eq!(translate(A_F_SCREEN, Some(5)), Some(NavCommand::ForwardScreen(5)));
    }

    #[test]
    fn translate_returns_none_for_prompt_opening_actions() {
        assert_eq!(translate(A_SEARCH_FORW, None), None);
    }

    #[test]
    fn prompt_for_action_maps_search_to_search_mode() {
        assert_eq!(prompt_for_action(A_SEARCH_FORW), Some(PromptMode::Search));
    }

    #[test]
    fn parse_opt_toggle_reads_sign_and_short_letter() {
        let req = parse_opt_toggle("+i");
        assert_eq!(req.sign, Some('+'));
        assert_eq!(req.name, OptName::Short('i'));
        assert_eq!(req.value, None);
    }

    #[test]
    fn parse_opt_toggle_reads_long_name_with_value() {
        let req = parse_opt_toggle("--tabs=4");
        assert_eq!(req.name, OptName::Long("tabs".to_string()));
        assert_eq!(req.value, Some("4".to_string()));
    }

    #[test]
    fn parse_opt_toggle_recognizes_quiet_marker() {
        let req = parse_opt_toggle("\u{10}e");
        assert!(req.quiet);
        assert_eq!(req.name, OptName::Short('e'));
    }

    #[test]
    fn finish_digit_prompt_parses_goto_line() {
        let store = OptionStore::new();
        let cmd = finish_prompt(PromptMode::Digit, "42", SearchModifiers::default(), &store);
        assert_eq!(cmd, NavCommand::GotoLine(42));
    }

    #[test]
    fn finish_search_prompt_carries_pattern_and_modifiers() {
        let store = OptionStore::new();
        let mods = SearchModifiers { invert: true, ..Default::default() };
        let cmd = finish_prompt(PromptMode::Search, "word", mods, &store);
        assert_eq!(
            cmd,
            NavCommand::SearchForward { pattern: "word".to_string(), modifiers: mods }
        );
    }
}
