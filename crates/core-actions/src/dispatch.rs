//! The top-level action dispatcher: feeds raw input bytes through
//! `core_keymap::Dispatcher`'s prefix trie, accumulates a leading digit
//! count, and routes either a resolved `NavCommand` or a newly opened
//! `Prompt` back to the caller. Whichever multi-character prompt is open
//! (if any) intercepts bytes ahead of the trie, exactly as spec §4.5
//! describes the prompt FSM sitting "above" the byte dispatcher.

use core_config::OptionStore;
use core_keymap::{Action, Dispatcher, Resolution};

use crate::nav::{self, NavCommand};
use crate::prompt::{Prompt, PromptMode, PromptOutcome};

/// What happened after feeding one byte to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// Need more input before a decision can be made (mid-prefix, or a
    /// prompt still accumulating its buffer).
    Pending,
    /// A full action resolved into a navigation command.
    Command(NavCommand),
    /// A prompt was opened; the caller may want to update the status line
    /// to show the prompt's leading character (e.g. `/`).
    PromptOpened(PromptMode),
    /// An open prompt was cancelled or aborted without producing a command.
    PromptClosed(PromptMode),
    /// No table anywhere matches this input; the table author capped the
    /// sub-tree, or the byte sequence is simply unbound.
    Invalid,
}

/// How many lines one wheel tick scrolls (`less` has no user-facing knob
/// for this; pick a single-line step so a tick never outruns the screen).
const WHEEL_SCROLL_LINES: u64 = 1;

/// Which mouse report envelope is being accumulated, and its bytes so far.
enum MouseReport {
    /// X10: exactly 3 more bytes follow (button, column, row), each the
    /// real value plus 32.
    X10(Vec<u8>),
    /// SGR-1006: `Cb;Cx;Cy` as ASCII digits, terminated by `M` (press/wheel)
    /// or `m` (release).
    Sgr(Vec<u8>),
}

pub struct ActionDispatcher {
    keymap: Dispatcher,
    prompt: Option<Prompt>,
    mouse: Option<MouseReport>,
    count_buf: String,
    input: Vec<u8>,
}

impl ActionDispatcher {
    pub fn new(keymap: Dispatcher) -> Self {
        Self {
            keymap,
            prompt: None,
            mouse: None,
            count_buf: String::new(),
            input: Vec::new(),
        }
    }

    pub fn is_prompt_open(&self) -> bool {
        self.prompt.is_some()
    }

    fn take_count(&mut self) -> Option<u64> {
        if self.count_buf.is_empty() {
            return None;
        }
        let parsed = self.count_buf.parse::<u64>().ok();
        self.count_buf.clear();
        parsed
    }

    /// Feed one decoded input byte. `store` is consulted only by a
    /// completing `OptToggle` prompt, to decide bool-vs-triple toggle
    /// semantics in `nav::finish_prompt`.
    pub fn feed(&mut self, byte: u8, store: &OptionStore) -> DispatchEvent {
        if let Some(report) = self.mouse.take() {
            return self.feed_mouse_byte(report, byte);
        }

        if let Some(prompt) = &mut self.prompt {
            let c = byte as char;
            return match prompt.feed(c) {
                None => DispatchEvent::Pending,
                Some(PromptOutcome::Cancelled) | Some(PromptOutcome::Aborted) => {
                    let mode = prompt.mode();
                    self.prompt = None;
                    DispatchEvent::PromptClosed(mode)
                }
                Some(PromptOutcome::Completed(text)) => {
                    let mode = prompt.mode();
                    let modifiers = prompt.modifiers;
                    self.prompt = None;
                    DispatchEvent::Command(nav::finish_prompt(mode, &text, modifiers, store))
                }
            };
        }

        if byte.is_ascii_digit() && self.input.is_empty() {
            self.count_buf.push(byte as char);
            return DispatchEvent::Pending;
        }

        self.input.push(byte);
        match self.keymap.resolve(&self.input) {
            Resolution::Prefix => DispatchEvent::Pending,
            Resolution::Invalid => {
                self.input.clear();
                self.count_buf.clear();
                DispatchEvent::Invalid
            }
            Resolution::Full(action) => {
                self.input.clear();
                self.on_action(action)
            }
        }
    }

    fn on_action(&mut self, action: Action) -> DispatchEvent {
        let action_id = match &action {
            Action::Named(id) | Action::NamedWithExtra(id, _) => *id,
            Action::X11MouseIn => {
                self.mouse = Some(MouseReport::X10(Vec::new()));
                return DispatchEvent::Pending;
            }
            Action::X116MouseIn => {
                self.mouse = Some(MouseReport::Sgr(Vec::new()));
                return DispatchEvent::Pending;
            }
            Action::Invalid => return DispatchEvent::Invalid,
        };
        if let Some(mode) = nav::prompt_for_action(action_id) {
            self.count_buf.clear();
            self.prompt = Some(Prompt::new(mode));
            return DispatchEvent::PromptOpened(mode);
        }
        let count = self.take_count();
        match nav::translate(action_id, count) {
            Some(cmd) => DispatchEvent::Command(cmd),
            None => DispatchEvent::Invalid,
        }
    }

    /// Accumulate one more byte of a mouse report envelope, returning the
    /// resolved command once the envelope is complete.
    fn feed_mouse_byte(&mut self, report: MouseReport, byte: u8) -> DispatchEvent {
        match report {
            MouseReport::X10(mut buf) => {
                buf.push(byte);
                if buf.len() < 3 {
                    self.mouse = Some(MouseReport::X10(buf));
                    return DispatchEvent::Pending;
                }
                mouse_command_from_x10(buf[0], buf[1], buf[2])
            }
            MouseReport::Sgr(mut buf) => {
                if byte != b'M' && byte != b'm' {
                    buf.push(byte);
                    self.mouse = Some(MouseReport::Sgr(buf));
                    return DispatchEvent::Pending;
                }
                mouse_command_from_sgr(&buf, byte == b'm')
            }
        }
    }
}

/// Decode an X10 mouse report (`Cb`, `Cx`, `Cy`, each the real value offset
/// by 32). Bit 6 set marks a wheel event; otherwise the low two bits of
/// `Cb` being `3` marks button release.
fn mouse_command_from_x10(cb: u8, _cx: u8, _cy: u8) -> DispatchEvent {
    let cb = cb.wrapping_sub(32);
    if cb & 0x40 != 0 {
        let forward = cb & 0x3 != 0;
        return DispatchEvent::Command(NavCommand::MouseScroll {
            forward,
            lines: WHEEL_SCROLL_LINES,
        });
    }
    if cb & 0x3 == 3 {
        return DispatchEvent::Command(NavCommand::MouseSetMark);
    }
    DispatchEvent::Invalid
}

/// Decode an SGR-1006 mouse report body (`Cb;Cx;Cy`, digits only, the
/// terminator already stripped off by the caller). `release` is true when
/// the report was terminated by `m` rather than `M`.
fn mouse_command_from_sgr(body: &[u8], release: bool) -> DispatchEvent {
    let text = String::from_utf8_lossy(body);
    let cb = match text.split(';').next().and_then(|s| s.parse::<i64>().ok()) {
        Some(cb) => cb,
        None => return DispatchEvent::Invalid,
    };
    match cb {
        64 => DispatchEvent::Command(NavCommand::MouseScroll { forward: false, lines: WHEEL_SCROLL_LINES }),
        65 => DispatchEvent::Command(NavCommand::MouseScroll { forward: true, lines: WHEEL_SCROLL_LINES }),
        _ if release => DispatchEvent::Command(NavCommand::MouseSetMark),
        _ => DispatchEvent::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_ids::{A_F_LINE, A_SEARCH_FORW};
    use core_keymap::ActionTable;

    fn dispatcher() -> ActionDispatcher {
        let mut table = ActionTable::decode(&[]);
        table.push_literal(b"j", A_F_LINE);
        table.push_literal(b"/", A_SEARCH_FORW);
        let mut keymap = Dispatcher::new();
        keymap.push_table(table);
        ActionDispatcher::new(keymap)
    }

    #[test]
    fn plain_key_resolves_to_command_immediately() {
        let mut d = dispatcher();
        let store = OptionStore::new();
        assert_eq!(
            d.feed(b'j', &store),
            DispatchEvent::Command(NavCommand::Forward(1))
        );
    }

    #[test]
    fn digit_prefix_becomes_the_next_commands_count() {
        let mut d = dispatcher();
        let store = OptionStore::new();
        assert_eq!(d.feed(b'5', &store), DispatchEvent::Pending);
        assert_eq!(
            d.feed(b'j', &store),
            DispatchEvent::Command(NavCommand::Forward(5))
        );
    }

    #[test]
    fn search_key_opens_a_prompt_then_completes_on_newline() {
        let mut d = dispatcher();
        let store = OptionStore::new();
        assert_eq!(
            d.feed(b'/', &store),
            DispatchEvent::PromptOpened(PromptMode::Search)
        );
        assert!(d.is_prompt_open());
        d.feed(b'f', &store);
        d.feed(b'o', &store);
        assert_eq!(
            d.feed(b'\n', &store),
            DispatchEvent::Command(NavCommand::SearchForward {
                pattern: "fo".to_string(),
                modifiers: Default::default(),
            })
        );
        assert!(!d.is_prompt_open());
    }

    #[test]
    fn unbound_byte_is_invalid_and_clears_buffer() {
        let mut d = dispatcher();
        let store = OptionStore::new();
        assert_eq!(d.feed(b'z', &store), DispatchEvent::Invalid);
        // Buffer was cleared, so a subsequent bound key still resolves cleanly.
        assert_eq!(
            d.feed(b'j', &store),
            DispatchEvent::Command(NavCommand::Forward(1))
        );
    }

    #[test]
    fn aborting_a_prompt_reports_prompt_closed() {
        let mut d = dispatcher();
        let store = OptionStore::new();
        d.feed(b'/', &store);
        assert_eq!(
            d.feed(b'\u{7}', &store),
            DispatchEvent::PromptClosed(PromptMode::Search)
        );
    }

    #[test]
    fn sgr_wheel_down_scrolls_forward() {
        let mut d = ActionDispatcher::new(crate::keymap_defaults::default_keymap());
        let store = OptionStore::new();
        for b in b"\x1b[<65;10;5" {
            assert_eq!(d.feed(*b, &store), DispatchEvent::Pending);
        }
        assert_eq!(
            d.feed(b'M', &store),
            DispatchEvent::Command(NavCommand::MouseScroll { forward: true, lines: WHEEL_SCROLL_LINES })
        );
    }

    #[test]
    fn sgr_button_release_sets_mark() {
        let mut d = ActionDispatcher::new(crate::keymap_defaults::default_keymap());
        let store = OptionStore::new();
        for b in b"\x1b[<0;3;4" {
            assert_eq!(d.feed(*b, &store), DispatchEvent::Pending);
        }
        assert_eq!(d.feed(b'm', &store), DispatchEvent::Command(NavCommand::MouseSetMark));
    }

    #[test]
    fn x10_wheel_up_scrolls_backward() {
        let mut d = ActionDispatcher::new(crate::keymap_defaults::default_keymap());
        let store = OptionStore::new();
        assert_eq!(d.feed(0x1b, &store), DispatchEvent::Pending);
        assert_eq!(d.feed(b'[', &store), DispatchEvent::Pending);
        assert_eq!(d.feed(b'M', &store), DispatchEvent::Pending);
        assert_eq!(d.feed(32 + 64, &store), DispatchEvent::Pending);
        assert_eq!(d.feed(32 + 10, &store), DispatchEvent::Pending);
        assert_eq!(
            d.feed(32 + 5, &store),
            DispatchEvent::Command(NavCommand::MouseScroll { forward: false, lines: WHEEL_SCROLL_LINES })
        );
    }
}
