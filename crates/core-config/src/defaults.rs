//! The built-in option registry: every short letter the pager understands
//! out of the box, registered with its long-name synonyms, type, and
//! default. `ox-bin` calls `default_options` once at startup, then applies
//! the command line and any `LESS`/config-file overrides on top.

use crate::{OptionDescriptor, OptionFlags, OptionStore, OptionType, OptionValue, Triple};

pub fn default_options() -> OptionStore {
    let mut s = OptionStore::new();

    s.register(OptionDescriptor {
        short: 'i',
        long_names: &["ignore-case"],
        ty: OptionType::Triple,
        default: OptionValue::Triple(Triple::Off),
        flags: OptionFlags::HILITE_REPAINT,
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'N',
        long_names: &["line-numbers"],
        ty: OptionType::Bool,
        default: OptionValue::Bool(false),
        flags: OptionFlags::REPAINT,
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'S',
        long_names: &["chop-long-lines"],
        ty: OptionType::Bool,
        default: OptionValue::Bool(false),
        flags: OptionFlags::REPAINT,
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'x',
        long_names: &["tabs"],
        ty: OptionType::Numeric,
        default: OptionValue::Numeric(crate::Numeric::Int(8)),
        flags: OptionFlags::REPAINT,
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'e',
        long_names: &["quit-at-eof"],
        ty: OptionType::Triple,
        default: OptionValue::Triple(Triple::Off),
        flags: OptionFlags::empty(),
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'F',
        long_names: &["quit-if-one-screen"],
        ty: OptionType::Bool,
        default: OptionValue::Bool(false),
        flags: OptionFlags::empty(),
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
        long_names: &["buffers"],
        ty: OptionType::Numeric,
        default: OptionValue::Numeric(crate::Numeric::Int(64)),
        flags: OptionFlags::NO_QUERY,
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'g',
        long_names: &["hilite-search-one"],
        ty: OptionType::Triple,
        default: OptionValue::Triple(Triple::On),
        flags: OptionFlags::HILITE_REPAINT,
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'h',
        long_names: &["max-back-scroll"],
        ty: OptionType::Numeric,
        default: OptionValue::Numeric(crate::Numeric::Int(-1)),
        flags: OptionFlags::empty(),
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'j',
        long_names: &["jump-target"],
        ty: OptionType::Numeric,
        default: OptionValue::Numeric(crate::Numeric::Int(1)),
        flags: OptionFlags::empty(),
        handler: None,
    });
    s.register(OptionDescriptor {
        short: 'm',
        long_names: &["long-prompt"],
        ty: OptionType::Triple,
        default: OptionValue::Triple(Triple::Off),
        flags: OptionFlags::REPAINT,
        handler: None,
    });
    s
}
