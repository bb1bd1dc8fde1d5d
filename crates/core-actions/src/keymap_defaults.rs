//! The built-in command table: the key bindings available before any user
//! `lesskey`-style override is loaded. `Dispatcher::resolve` checks tables
//! in push order and returns the first full match, so a loaded override
//! table must be pushed *before* this one to shadow any of its entries.

use crate::action_ids::*;
use core_keymap::{Action, ActionTable, Dispatcher};

/// Build the default command table on its own, so a caller can push a
/// `lesskey`-loaded override ahead of it.
pub fn default_command_table() -> ActionTable {
    let mut table = ActionTable::decode(&[]);
    bind(&mut table);
    table
}

/// A fresh `Dispatcher` holding only the default command table. Callers
/// with no override table can use this directly; callers with one should
/// build their own `Dispatcher`, pushing the override ahead of
/// `default_command_table()`.
pub fn default_keymap() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.push_table(default_command_table());
    dispatcher
}

fn bind(t: &mut ActionTable) {
    t.push_literal(b"\x0e", A_F_LINE); // ^N, alongside j/Down
    t.push_literal(b"j", A_F_LINE);
    t.push_literal(b"\r", A_F_LINE);
    t.push_literal(b"\n", A_F_LINE);
    t.push_literal(b"e", A_F_LINE);

    t.push_literal(b"k", A_B_LINE);
    t.push_literal(b"y", A_B_LINE);
    t.push_literal(b"\x10", A_B_LINE); // ^P

    t.push_literal(b" ", A_F_SCREEN);
    t.push_literal(b"f", A_F_SCREEN);
    t.push_literal(b"\x06", A_F_SCREEN); // ^F

    t.push_literal(b"b", A_B_SCREEN);
    t.push_literal(b"\x02", A_B_SCREEN); // ^B

    t.push_literal(b"d", A_F_HALF_SCREEN);
    t.push_literal(b"\x04", A_F_HALF_SCREEN); // ^D
    t.push_literal(b"u", A_B_HALF_SCREEN);
    t.push_literal(b"\x15", A_B_HALF_SCREEN); // ^U

    t.push_literal(b"g", A_GOTO_LINE);
    t.push_literal(b"<", A_GOTO_LINE);
    t.push_literal(b"G", A_GOTO_END);
    t.push_literal(b">", A_GOTO_END);

    t.push_literal(b"/", A_SEARCH_FORW);
    t.push_literal(b"?", A_SEARCH_BACK);
    t.push_literal(b"&", A_FILTER);
    t.push_literal(b"n", A_REPEAT_SEARCH);
    t.push_literal(b"N", A_REPEAT_SEARCH_REV);

    t.push_literal(b"-", A_OPT_TOGGLE);

    t.push_literal(b"m", A_SETMARK);
    t.push_literal(b"'", A_GOMARK);

    t.push_literal(b"|", A_PIPE);
    t.push_literal(b":e", A_EXAMINE);
    t.push_literal(b"!", A_SHELL);
    t.push_literal(b"+", A_FIRSTCMD);

    t.push_literal(b"q", A_QUIT);
    t.push_literal(b"Q", A_QUIT);
    t.push_literal(b"ZZ", A_QUIT);

    t.push_literal(b"\x0c", A_REPAINT); // ^L
    t.push_literal(b"R", A_REPAINT);
    t.push_literal(b"=", A_STATUS);
    t.push_literal(b"\x03", A_INTERRUPT); // ^C

    for d in b'0'..=b'9' {
        t.push_literal(&[d], A_DIGIT);
    }

    // X10 and SGR-1006 mouse report envelopes; the dispatcher consumes the
    // following report bytes itself once one of these sentinels resolves.
    t.push_mouse_sentinel(b"\x1b[M", Action::X11MouseIn);
    t.push_mouse_sentinel(b"\x1b[<", Action::X116MouseIn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::OptionStore;

    #[test]
    fn forward_line_keys_resolve_to_the_same_action() {
        let dispatcher = default_keymap();
        let mut d = crate::ActionDispatcher::new(dispatcher);
        let store = OptionStore::new();
        assert_eq!(
            d.feed(b'j', &store),
            crate::DispatchEvent::Command(crate::NavCommand::Forward(1))
        );
    }

    #[test]
    fn quit_two_letter_sequence_resolves() {
        let dispatcher = default_keymap();
        let mut d = crate::ActionDispatcher::new(dispatcher);
        let store = OptionStore::new();
        assert_eq!(d.feed(b'Z', &store), crate::DispatchEvent::Pending);
        assert_eq!(
            d.feed(b'Z', &store),
            crate::DispatchEvent::Command(crate::NavCommand::Quit(None))
        );
    }

    #[test]
    fn digit_then_forward_screen_carries_count() {
        let dispatcher = default_keymap();
        let mut d = crate::ActionDispatcher::new(dispatcher);
        let store = OptionStore::new();
        assert_eq!(d.feed(b'3', &store), crate::DispatchEvent::Pending);
        assert_eq!(
            d.feed(b'f', &store),
            crate::DispatchEvent::Command(crate::NavCommand::ForwardScreen(3))
        );
    }

    #[test]
    fn search_forward_key_opens_prompt() {
        let dispatcher = default_keymap();
        let mut d = crate::ActionDispatcher::new(dispatcher);
        let store = OptionStore::new();
        assert_eq!(
            d.feed(b'/', &store),
            crate::DispatchEvent::PromptOpened(crate::PromptMode::Search)
        );
    }
}
