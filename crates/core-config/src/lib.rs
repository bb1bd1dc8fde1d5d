//! The typed option store (spec §4.6): every runtime-tunable parameter is a
//! single descriptor naming a short letter, zero or more long synonyms, a
//! type tag, a default, and the backing cell it reads/writes. Bool and
//! triple options toggle through case-sensitive letters the way `-i`/`-I` or
//! `-g`/`-G` do; numeric and string options take an inline or following
//! argument; variable-less options are pure handlers (`--version`).
//!
//! This crate only holds the registry and its parsing/toggling semantics. It
//! does not know about any particular option's meaning — `core-model` wires
//! concrete option letters (`-i`, `-N`, `-x`, ...) to the backing cells that
//! steer the renderer, cache, and dispatcher.

use std::collections::HashMap;
use thiserror::Error;

pub mod defaults;
pub mod disk;

pub use defaults::default_options;
pub use disk::{DiskConfig, DiskConfigError};

/// The three values a triple option can hold. Values matter: a handler can
/// compare numerically (`value >= ON`) without matching on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Triple {
    Off = 0,
    On = 1,
    OnPlus = 2,
}

/// A numeric option's value: an integer, or a parts-per-million fraction
/// when the argument began with `.` (used for proportional scroll geometry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    Int(i64),
    /// Parts per 10^6, e.g. `.5` (half) is `Frac(500_000)`.
    Frac(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Triple(Triple),
    Numeric(Numeric),
    Str(String),
    /// Variable-less options carry no value; only their handler runs.
    None,
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_triple(&self) -> Option<Triple> {
        match self {
            OptionValue::Triple(t) => Some(*t),
            _ => None,
        }
    }
    pub fn as_numeric(&self) -> Option<Numeric> {
        match self {
            OptionValue::Numeric(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Bool,
    Triple,
    Numeric,
    Str,
    /// Pure handler, no backing value (`--version`, `--help`).
    VariableLess,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct OptionFlags: u8 {
        /// A TOGGLE invalidates the current frame and forces a full repaint.
        const REPAINT        = 0b0000_0001;
        /// Like REPAINT, but also recomputes search hilites (control chars
        /// render differently, so match columns shift).
        const HILITE_REPAINT = 0b0000_0010;
        /// `:o`-style toggle is refused (e.g. once a log file is attached to
        /// a seekable source, `-o` can no longer be changed).
        const NO_TOGGLE       = 0b0000_0100;
        /// `-o` query form (bare letter, no argument) is refused.
        const NO_QUERY        = 0b0000_1000;
        /// The handler also runs once at startup, in `Phase::Init`, to let it
        /// compute a terminal-dependent default (e.g. window geometry).
        const INIT_HANDLER    = 0b0001_0000;
    }
}

/// When a handler runs: at startup to compute a default, in response to a
/// bare query (`-x` with no value), or after a toggle took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Query,
    Toggle,
}

pub type Handler = fn(Phase, &OptionValue);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),
    #[error("ambiguous option name {0:?}: matches {1:?}")]
    Ambiguous(String, Vec<&'static str>),
    #[error("option {0} cannot be toggled")]
    NotToggleable(&'static str),
    #[error("option {0} cannot be queried")]
    NotQueryable(&'static str),
    #[error("bad value for option {0}: {1}")]
    BadValue(&'static str, String),
}

pub type OptionResult<T> = Result<T, OptionError>;

pub struct OptionDescriptor {
    pub short: char,
    /// Synonyms for `--long-name` matching; first entry is canonical.
    pub long_names: &'static [&'static str],
    pub ty: OptionType,
    pub default: OptionValue,
    pub flags: OptionFlags,
    pub handler: Option<Handler>,
}

/// A registered option's live value plus a copy of its descriptor metadata
/// needed at lookup time.
struct Slot {
    desc: OptionDescriptor,
    value: OptionValue,
}

/// The registry: every option the binary knows about, indexed for both
/// short-letter and long-name lookup.
#[derive(Default)]
pub struct OptionStore {
    slots: Vec<Slot>,
    by_short: HashMap<char, usize>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, desc: OptionDescriptor) {
        let short = desc.short;
        let value = desc.default.clone();
        let idx = self.slots.len();
        self.slots.push(Slot { desc, value });
        self.by_short.insert(short, idx);
    }

    /// Run every `INIT_HANDLER`-flagged option's handler once at startup.
    pub fn run_init_handlers(&self) {
        for slot in &self.slots {
            if slot.desc.flags.contains(OptionFlags::INIT_HANDLER)
                && let Some(h) = slot.desc.handler
            {
                h(Phase::Init, &slot.value);
            }
        }
    }

    fn find_short(&self, letter: char) -> OptionResult<usize> {
        self.by_short
            .get(&letter)
            .copied()
            .ok_or_else(|| OptionError::Unknown(letter.to_string()))
    }

    /// Resolve a (possibly partial) `--long-name`: exact match wins outright;
    /// otherwise the longest unique prefix wins; two or more candidates tied
    /// at the same prefix length is `Ambiguous`.
    pub fn find_long(&self, name: &str) -> OptionResult<usize> {
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.desc.long_names.iter().any(|n| *n == name) {
                return Ok(idx);
            }
        }
        let mut candidates: Vec<(usize, &'static str)> = Vec::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            for long in slot.desc.long_names {
                if long.starts_with(name) {
                    candidates.push((idx, long));
                }
            }
        }
        match candidates.len() {
            0 => Err(OptionError::Unknown(name.to_string())),
            1 => Ok(candidates[0].0),
            _ => Err(OptionError::Ambiguous(
                name.to_string(),
                candidates.iter().map(|(_, n)| *n).collect(),
            )),
        }
    }

    pub fn get(&self, letter: char) -> OptionResult<&OptionValue> {
        let idx = self.find_short(letter)?;
        Ok(&self.slots[idx].value)
    }

    pub fn get_by_long(&self, name: &str) -> OptionResult<&OptionValue> {
        let idx = self.find_long(name)?;
        Ok(&self.slots[idx].value)
    }

    /// Query-phase read: refused for `NO_QUERY` options, runs the handler
    /// (if any) with `Phase::Query` so it can format/display the value.
    pub fn query(&self, letter: char) -> OptionResult<&OptionValue> {
        let idx = self.find_short(letter)?;
        let slot = &self.slots[idx];
        if slot.desc.flags.contains(OptionFlags::NO_QUERY) {
            return Err(OptionError::NotQueryable(slot.desc.long_names.first().copied().unwrap_or("")));
        }
        if let Some(h) = slot.desc.handler {
            h(Phase::Query, &slot.value);
        }
        Ok(&slot.value)
    }

    fn set_raw(&mut self, idx: usize, value: OptionValue) -> OptionResult<()> {
        let slot = &mut self.slots[idx];
        if slot.desc.flags.contains(OptionFlags::NO_TOGGLE) {
            return Err(OptionError::NotToggleable(
                slot.desc.long_names.first().copied().unwrap_or(""),
            ));
        }
        slot.value = value;
        if let Some(h) = slot.desc.handler {
            h(Phase::Toggle, &slot.value);
        }
        let name = slot.desc.long_names.first().copied().unwrap_or("");
        if slot.desc.flags.intersects(OptionFlags::REPAINT | OptionFlags::HILITE_REPAINT) {
            tracing::debug!(target: "config", option = name, "option_change_invalidates_frame");
        }
        Ok(())
    }

    /// Toggle a `bool` option (flip 0/1) by short letter.
    pub fn toggle_bool(&mut self, letter: char) -> OptionResult<bool> {
        let idx = self.find_short(letter)?;
        let slot = &self.slots[idx];
        if slot.desc.ty != OptionType::Bool {
            return Err(OptionError::BadValue(
                slot.desc.long_names.first().copied().unwrap_or(""),
                "not a bool option".into(),
            ));
        }
        let cur = slot.value.as_bool().unwrap_or(false);
        self.set_raw(idx, OptionValue::Bool(!cur))?;
        Ok(!cur)
    }

    /// Set a `bool` option to an explicit value, bypassing the flip. Used by
    /// non-keystroke configuration layers (CLI flags, the disk config file)
    /// that know the value they want rather than toggling it.
    pub fn set_bool(&mut self, letter: char, value: bool) -> OptionResult<()> {
        let idx = self.find_short(letter)?;
        if self.slots[idx].desc.ty != OptionType::Bool {
            return Err(OptionError::BadValue(
                self.slots[idx].desc.long_names.first().copied().unwrap_or(""),
                "not a bool option".into(),
            ));
        }
        self.set_raw(idx, OptionValue::Bool(value))
    }

    /// Set a `triple` option to an explicit value, bypassing the flip.
    pub fn set_triple(&mut self, letter: char, value: Triple) -> OptionResult<()> {
        let idx = self.find_short(letter)?;
        if self.slots[idx].desc.ty != OptionType::Triple {
            return Err(OptionError::BadValue(
                self.slots[idx].desc.long_names.first().copied().unwrap_or(""),
                "not a triple option".into(),
            ));
        }
        self.set_raw(idx, OptionValue::Triple(value))
    }

    /// Toggle a `triple` option: `lower` is the case-sensitive letter that
    /// was actually typed. Lowercase flips default<->ON; uppercase flips
    /// default<->ON_PLUS. Two lowercase toggles restore the original value;
    /// lowercase then uppercase lands on ON_PLUS (spec §8 property 7).
    pub fn toggle_triple(&mut self, letter: char, is_upper: bool) -> OptionResult<Triple> {
        let idx = self.find_short(letter)?;
        let slot = &self.slots[idx];
        if slot.desc.ty != OptionType::Triple {
            return Err(OptionError::BadValue(
                slot.desc.long_names.first().copied().unwrap_or(""),
                "not a triple option".into(),
            ));
        }
        let default = slot.desc.default.as_triple().unwrap_or(Triple::Off);
        let cur = slot.value.as_triple().unwrap_or(default);
        let target = if is_upper { Triple::OnPlus } else { Triple::On };
        let next = if cur == default { target } else { default };
        self.set_raw(idx, OptionValue::Triple(next))?;
        Ok(next)
    }

    /// Set a numeric option from a decimal argument, with optional leading
    /// sign and an optional leading `.` for a parts-per-million fraction.
    pub fn set_numeric(&mut self, letter: char, arg: &str) -> OptionResult<Numeric> {
        let idx = self.find_short(letter)?;
        let name = self.slots[idx].desc.long_names.first().copied().unwrap_or("");
        let value = parse_numeric(arg).ok_or_else(|| OptionError::BadValue(name, arg.to_string()))?;
        self.set_raw(idx, OptionValue::Numeric(value))?;
        Ok(value)
    }

    /// Set a string option. `sentinel`, if present, is the byte that
    /// terminates the argument (escaped with a backslash to embed it
    /// literally); `None` consumes the whole remaining argument.
    pub fn set_string(&mut self, letter: char, arg: &str, sentinel: Option<char>) -> OptionResult<String> {
        let idx = self.find_short(letter)?;
        let value = parse_string_arg(arg, sentinel);
        self.set_raw(idx, OptionValue::Str(value.clone()))?;
        Ok(value)
    }

    pub fn descriptor(&self, letter: char) -> Option<&OptionDescriptor> {
        self.by_short.get(&letter).map(|&idx| &self.slots[idx].desc)
    }
}

/// Parse a numeric option argument: optional sign, then digits, or a leading
/// `.` introducing a parts-per-million fraction (`.5` => 500000, `.25` =>
/// 250000). Anything else is rejected rather than guessed at.
fn parse_numeric(arg: &str) -> Option<Numeric> {
    let arg = arg.trim();
    if let Some(frac) = arg.strip_prefix('.') {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits = format!("{frac:0<6}");
        let digits = &digits[..6.min(digits.len())];
        return digits.parse::<u32>().ok().map(Numeric::Frac);
    }
    arg.parse::<i64>().ok().map(Numeric::Int)
}

/// Parse a string option argument: stop at the first unescaped `sentinel`
/// byte, turning `\<sentinel>` into a literal `<sentinel>`.
fn parse_string_arg(arg: &str, sentinel: Option<char>) -> String {
    let Some(sentinel) = sentinel else {
        return arg.to_string();
    };
    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&sentinel) {
            out.push(sentinel);
            chars.next();
            continue;
        }
        if c == sentinel {
            break;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> OptionStore {
        let mut s = OptionStore::new();
        s.register(OptionDescriptor {
            short: 'i',
            long_names: &["ignore-case"],
            ty: OptionType::Triple,
            default: OptionValue::Triple(Triple::Off),
            flags: OptionFlags::empty(),
            handler: None,
        });
        s.register(OptionDescriptor {
            short: 'e',
            long_names: &["quit-at-eof"],
            ty: OptionType::Bool,
            default: OptionValue::Bool(false),
            flags: OptionFlags::REPAINT,
            handler: None,
        });
        s.register(OptionDescriptor {
            short: 'x',
            long_names: &["tabs"],
            ty: OptionType::Numeric,
            default: OptionValue::Numeric(Numeric::Int(8)),
            flags: OptionFlags::REPAINT,
            handler: None,
        });
        s.register(OptionDescriptor {
            short: 'o',
            long_names: &["log-file"],
            ty: OptionType::Str,
            default: OptionValue::Str(String::new()),
            flags: OptionFlags::empty(),
            handler: None,
        });
        s.register(OptionDescriptor {
            short: 'b',
            long_names: &["auto-buffers"],
            ty: OptionType::Numeric,
            default: OptionValue::Numeric(Numeric::Int(64)),
            flags: OptionFlags::empty(),
            handler: None,
        });
        s.register(OptionDescriptor {
            short: 'q',
            long_names: &["auto-quit"],
            ty: OptionType::Bool,
            default: OptionValue::Bool(false),
            flags: OptionFlags::empty(),
            handler: None,
        });
        s
    }

    #[test]
    fn bool_toggle_is_involutive() {
        let mut s = sample_store();
        let first = s.toggle_bool('e').unwrap();
        assert!(first);
        let second = s.toggle_bool('e').unwrap();
        assert!(!second);
        assert_eq!(s.get('e').unwrap().as_bool(), Some(false));
    }

    #[test]
    fn triple_lowercase_toggle_is_involutive() {
        let mut s = sample_store();
        let a = s.toggle_triple('i', false).unwrap();
        assert_eq!(a, Triple::On);
        let b = s.toggle_triple('i', false).unwrap();
        assert_eq!(b, Triple::Off);
    }

    #[test]
    fn triple_lower_then_upper_lands_on_on_plus() {
        let mut s = sample_store();
        s.toggle_triple('i', false).unwrap();
        let result = s.toggle_triple('i', true).unwrap();
        assert_eq!(result, Triple::OnPlus);
    }

    #[test]
    fn numeric_parses_sign_and_plain_integer() {
        let mut s = sample_store();
        let v = s.set_numeric('x', "-4").unwrap();
        assert_eq!(v, Numeric::Int(-4));
    }

    #[test]
    fn numeric_parses_fractional_value() {
        let mut s = sample_store();
        let v = s.set_numeric('x', ".5").unwrap();
        assert_eq!(v, Numeric::Frac(500_000));
    }

    #[test]
    fn numeric_rejects_garbage() {
        let mut s = sample_store();
        assert!(s.set_numeric('x', "abc").is_err());
    }

    #[test]
    fn string_option_stops_at_sentinel_unless_escaped() {
        let mut s = sample_store();
        let v = s.set_string('o', r"foo\;bar;baz", Some(';')).unwrap();
        assert_eq!(v, "foo;bar");
    }

    #[test]
    fn long_name_exact_match_wins() {
        let s = sample_store();
        assert!(s.find_long("tabs").is_ok());
    }

    #[test]
    fn long_name_ambiguous_prefix_is_rejected() {
        let mut s = sample_store();
        s.register(OptionDescriptor {
            short: 'B',
            long_names: &["auto-quit-unique"],
            ty: OptionType::Bool,
            default: OptionValue::Bool(false),
            flags: OptionFlags::empty(),
            handler: None,
        });
        // "auto-" is ambiguous across auto-buffers / auto-quit / auto-quit-unique.
        assert!(matches!(s.find_long("auto-"), Err(OptionError::Ambiguous(_, _))));
        // "auto-b" uniquely resolves to auto-buffers.
        assert_eq!(s.find_long("auto-b").unwrap(), s.find_long("auto-buffers").unwrap());
    }

    #[test]
    fn no_toggle_option_refuses_change() {
        let mut s = sample_store();
        s.register(OptionDescriptor {
            short: 'L',
            long_names: &["locked"],
            ty: OptionType::Bool,
            default: OptionValue::Bool(false),
            flags: OptionFlags::NO_TOGGLE,
            handler: None,
        });
        assert!(matches!(s.toggle_bool('L'), Err(OptionError::NotToggleable(_))));
    }

    #[test]
    fn no_query_option_refuses_bare_query() {
        let mut s = sample_store();
        s.register(OptionDescriptor {
            short: 'Q',
            long_names: &["write-only"],
            ty: OptionType::Bool,
            default: OptionValue::Bool(false),
            flags: OptionFlags::NO_QUERY,
            handler: None,
        });
        assert!(matches!(s.query('Q'), Err(OptionError::NotQueryable(_))));
    }

    #[test]
    fn init_handlers_run_once_at_startup() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn handler(phase: Phase, _v: &OptionValue) {
            if phase == Phase::Init {
                CALLS.fetch_add(1, Ordering::SeqCst);
            }
        }
        let mut s = OptionStore::new();
        s.register(OptionDescriptor {
            short: 'w',
            long_names: &["window"],
            ty: OptionType::Numeric,
            default: OptionValue::Numeric(Numeric::Int(0)),
            flags: OptionFlags::INIT_HANDLER,
            handler: Some(handler),
        });
        s.run_init_handlers();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
