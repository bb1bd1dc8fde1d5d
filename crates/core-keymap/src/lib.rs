//! Action-table format and prefix-trie resolution (spec §4.5): translates
//! byte sequences typed at the terminal into semantic actions. The same
//! table format serves built-in bindings, user `lesskey`-style overrides,
//! and per-terminal keypad sequences (arrow keys, Page Up/Down) once their
//! envelopes are expanded against the detected terminal's actual escape
//! sequences.
//!
//! A table is a flat byte array of variable-length records; the dispatcher
//! never parses it into a tree up front. Instead `resolve` walks every table
//! in priority order on each keystroke, doing a byte-by-byte prefix compare,
//! the way the teacher's original NGI engine walked its mapping tables.

pub mod keyfile;
pub use keyfile::{KeyFile, KeyFileError};

/// Terminates a table. Never a valid leading byte of a bound sequence.
pub const A_END_LIST: u8 = 0x00;
/// Padding filler left over from an expanded special-key envelope whose
/// terminal sequence was shorter than the envelope's reserved length.
pub const A_SKIP: u8 = 0x01;
/// Marks a record whose trigger is a named special key rather than literal
/// bytes; expanded in place before the table is used (see `expand_special_keys`).
pub const A_SPECIAL_KEY: u8 = 0x02;
/// Marks an action byte followed by a NUL-terminated canned string operand
/// (e.g. a long-form action bound to a literal reply string).
pub const A_EXTRA: u8 = 0x03;

/// A key-id for the small set of named special keys a terminal can report
/// (arrows, paging, editing keys). The expansion pass maps these to the
/// detected terminal's actual byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,
    Backspace,
}

/// A resolved dispatch action. `X11MouseIn`/`X116MouseIn` are sentinels: the
/// caller must then consume a fixed or variable number of additional bytes
/// describing the mouse event before acting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Invalid,
    Named(u16),
    NamedWithExtra(u16, Vec<u8>),
    X11MouseIn,
    X116MouseIn,
}

/// Outcome of one resolution attempt against the full table stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A full, unambiguous match; the dispatcher should act and clear its
    /// input buffer.
    Full(Action),
    /// At least one table needs more bytes and no table produced a full
    /// match; the caller should read another byte and try again.
    Prefix,
    /// No table's records begin this way; the table author capped this
    /// sub-tree with `A_END_LIST`, or no record anywhere matches.
    Invalid,
}

/// One decoded table record: a binding's literal byte trigger plus its action.
struct Record {
    bytes: Vec<u8>,
    action_id: u16,
    extra: Option<Vec<u8>>,
    mouse_sentinel: Option<Action>,
}

/// A single action table (a built-in set, or a user's lesskey override),
/// decoded from the flat byte format into records for fast repeated walks.
pub struct ActionTable {
    records: Vec<Record>,
}

impl ActionTable {
    /// Decode a flat byte-record table. Stops at `A_END_LIST`; a record
    /// reaching that byte before its own terminator is dropped (the
    /// table author's way of capping a sub-tree, so no binding lands there).
    pub fn decode(bytes: &[u8]) -> Self {
        let mut records = Vec::new();
        let mut i = 0usize;
        while i < bytes.len() {
            if bytes[i] == A_END_LIST {
                break;
            }
            let mut trigger = Vec::new();
            let mut capped = false;
            while i < bytes.len() && bytes[i] != 0 {
                if bytes[i] == A_END_LIST {
                    capped = true;
                    break;
                }
                trigger.push(bytes[i]);
                i += 1;
            }
            if capped || trigger.is_empty() || i >= bytes.len() {
                break;
            }
            i += 1; // skip NUL trigger terminator
            if i >= bytes.len() {
                break;
            }
            let action_byte = bytes[i];
            i += 1;
            if action_byte == A_EXTRA {
                if i >= bytes.len() {
                    break;
                }
                let real_action = bytes[i] as u16;
                i += 1;
                let extra_start = i;
                while i < bytes.len() && bytes[i] != 0 {
                    i += 1;
                }
                let extra = bytes[extra_start..i].to_vec();
                if i < bytes.len() {
                    i += 1; // skip terminating NUL
                }
                records.push(Record {
                    bytes: trigger,
                    action_id: real_action,
                    extra: Some(extra),
                    mouse_sentinel: None,
                });
            } else {
                records.push(Record {
                    bytes: trigger,
                    action_id: action_byte as u16,
                    extra: None,
                    mouse_sentinel: None,
                });
            }
        }
        Self { records }
    }

    /// Register a literal binding directly, bypassing byte-format decoding.
    /// Used for built-in tables constructed in Rust rather than loaded from
    /// a key-binding file.
    pub fn push_literal(&mut self, trigger: &[u8], action_id: u16) {
        self.records.push(Record {
            bytes: trigger.to_vec(),
            action_id,
            extra: None,
            mouse_sentinel: None,
        });
    }

    pub fn push_mouse_sentinel(&mut self, trigger: &[u8], action: Action) {
        self.records.push(Record {
            bytes: trigger.to_vec(),
            action_id: 0,
            extra: None,
            mouse_sentinel: Some(action),
        });
    }

    /// Walk this table's records against `input`. Mismatch is per-record, so
    /// one table can hold both a longer prefix record and a shorter full
    /// match for an unrelated sequence.
    fn resolve_one(&self, input: &[u8]) -> Resolution {
        let mut saw_prefix = false;
        for rec in &self.records {
            let cmp_len = rec.bytes.len().min(input.len());
            if rec.bytes[..cmp_len] != input[..cmp_len] {
                continue;
            }
            if input.len() < rec.bytes.len() {
                saw_prefix = true;
                continue;
            }
            if input.len() == rec.bytes.len() {
                if let Some(sentinel) = &rec.mouse_sentinel {
                    return Resolution::Full(sentinel.clone());
                }
                let action = match &rec.extra {
                    Some(extra) => Action::NamedWithExtra(rec.action_id, extra.clone()),
                    None => Action::Named(rec.action_id),
                };
                return Resolution::Full(action);
            }
        }
        if saw_prefix {
            Resolution::Prefix
        } else {
            Resolution::Invalid
        }
    }
}

/// Expand every `A_SPECIAL_KEY` envelope in a raw table against the bytes a
/// terminal actually emits for that key, padding unused reserved bytes with
/// `A_SKIP`. Must run once, before the table is used, for every
/// terminal-dependent table (built-ins that bind arrow keys, Page Up/Down).
pub fn expand_special_keys(raw: &mut [u8], lookup: impl Fn(SpecialKey) -> Option<Vec<u8>>) {
    let keys = [
        (0u8, SpecialKey::Up),
        (1, SpecialKey::Down),
        (2, SpecialKey::Left),
        (3, SpecialKey::Right),
        (4, SpecialKey::PageUp),
        (5, SpecialKey::PageDown),
        (6, SpecialKey::Home),
        (7, SpecialKey::End),
        (8, SpecialKey::Insert),
        (9, SpecialKey::Delete),
        (10, SpecialKey::Backspace),
    ];
    let mut i = 0usize;
    while i < raw.len() {
        if raw[i] == A_SPECIAL_KEY && i + 2 < raw.len() {
            let key_id = raw[i + 1];
            let reserved_len = raw[i + 2] as usize;
            let body_start = i + 3;
            let body_end = (body_start + reserved_len).min(raw.len());
            if let Some((_, key)) = keys.iter().find(|(id, _)| *id == key_id)
                && let Some(seq) = lookup(*key)
            {
                for (slot, &b) in raw[body_start..body_end].iter_mut().zip(
                    seq.iter()
                        .chain(std::iter::repeat(&A_SKIP))
                        .take(body_end - body_start),
                ) {
                    *slot = b;
                }
            }
            i = body_end;
        } else {
            i += 1;
        }
    }
}

/// The dispatcher: an ordered stack of tables, built-ins first, then
/// environment/user-loaded overrides. The first non-`Invalid` action across
/// all tables, in order, wins — so a user override earlier in the stack can
/// shadow a built-in, and a later table's full match still fires if every
/// earlier table missed entirely.
#[derive(Default)]
pub struct Dispatcher {
    tables: Vec<ActionTable>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Push a table at the back of the stack (lowest priority so far).
    pub fn push_table(&mut self, table: ActionTable) {
        self.tables.push(table);
    }

    /// Resolve one input buffer across the whole table stack. `Prefix` is
    /// only returned when no table produced a full match, even if another
    /// table would've matched something else entirely for a different
    /// continuation.
    pub fn resolve(&self, input: &[u8]) -> Resolution {
        let mut any_prefix = false;
        for table in &self.tables {
            match table.resolve_one(input) {
                Resolution::Full(action) => return Resolution::Full(action),
                Resolution::Prefix => any_prefix = true,
                Resolution::Invalid => {}
            }
        }
        if any_prefix {
            Resolution::Prefix
        } else {
            Resolution::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_table() -> ActionTable {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"j\x00\x01"); // trigger "j", action 1
        bytes.extend_from_slice(b"gg\x00\x02"); // trigger "gg", action 2
        bytes.push(A_END_LIST);
        ActionTable::decode(&bytes)
    }

    #[test]
    fn full_match_resolves_immediately() {
        let t = build_table();
        assert_eq!(t.resolve_one(b"j"), Resolution::Full(Action::Named(1)));
    }

    #[test]
    fn partial_prefix_waits_for_more_input() {
        let t = build_table();
        assert_eq!(t.resolve_one(b"g"), Resolution::Prefix);
    }

    #[test]
    fn full_second_byte_completes_multi_byte_trigger() {
        let t = build_table();
        assert_eq!(t.resolve_one(b"gg"), Resolution::Full(Action::Named(2)));
    }

    #[test]
    fn unrelated_byte_is_invalid() {
        let t = build_table();
        assert_eq!(t.resolve_one(b"z"), Resolution::Invalid);
    }

    #[test]
    fn dispatcher_prefers_earlier_table_full_match() {
        let mut d = Dispatcher::new();
        let mut user_table = ActionTable::decode(&[]);
        user_table.push_literal(b"j", 99);
        d.push_table(user_table);
        d.push_table(build_table());
        assert_eq!(d.resolve(b"j"), Resolution::Full(Action::Named(99)));
    }

    #[test]
    fn dispatcher_falls_through_to_later_table_when_earlier_misses() {
        let mut d = Dispatcher::new();
        let empty = ActionTable::decode(&[A_END_LIST]);
        d.push_table(empty);
        d.push_table(build_table());
        assert_eq!(d.resolve(b"j"), Resolution::Full(Action::Named(1)));
    }

    #[test]
    fn extra_string_operand_is_decoded() {
        let mut bytes = Vec::new();
        bytes.push(b'q');
        bytes.push(0);
        bytes.push(A_EXTRA);
        bytes.push(5);
        bytes.extend_from_slice(b"reply");
        bytes.push(0);
        bytes.push(A_END_LIST);
        let t = ActionTable::decode(&bytes);
        assert_eq!(
            t.resolve_one(b"q"),
            Resolution::Full(Action::NamedWithExtra(5, b"reply".to_vec()))
        );
    }

    #[test]
    fn special_key_expansion_fills_reserved_bytes_and_pads_skip() {
        let mut raw = vec![A_SPECIAL_KEY, 3, 4, 0, 0, 0, 0];
        expand_special_keys(&mut raw, |k| {
            if k == SpecialKey::Right {
                Some(vec![0x1b, b'[', b'C'])
            } else {
                None
            }
        });
        assert_eq!(&raw[3..7], &[0x1b, b'[', b'C', A_SKIP]);
    }
}
