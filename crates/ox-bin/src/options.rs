//! Option layering: built-in defaults, then the on-disk config file, then
//! the combined `LESS`/`MORE` environment variable, then the command line —
//! each layer applied on top of the last, exactly the order the teacher's
//! own config loader composes file/env/CLI layers.

use core_actions::{OptName, OptToggleRequest};
use core_config::{OptionStore, OptionType, OptionValue, Triple};

use crate::Args;

/// Apply the on-disk `config.toml`, if one exists, onto `store`. A missing
/// or unreadable file just leaves the built-in defaults in place.
pub fn apply_disk_config(store: &mut OptionStore) {
    let Some(path) = core_config::disk::config_path() else {
        return;
    };
    match core_config::disk::load(&path) {
        Ok(Some(disk)) => core_config::disk::apply(store, &disk),
        Ok(None) => {}
        Err(err) => tracing::warn!(target: "config", %err, "failed to parse config file"),
    }
}

/// Apply the combined-options environment variable (`LESS`, falling back to
/// `MORE`) onto `store`. Read before the command line, so CLI flags win on
/// conflict.
pub fn apply_env_options(store: &mut OptionStore) {
    let Some(raw) = std::env::var("LESS").or_else(|_| std::env::var("MORE")).ok() else {
        return;
    };
    for token in raw.split_whitespace() {
        apply_option_token(store, token);
    }
}

/// Apply one whitespace-separated token from the `LESS`/`MORE` string: a
/// `--long-name[=value]` option, or a run of short letters where the first
/// letter taking an argument consumes the remainder of the token.
fn apply_option_token(store: &mut OptionStore, token: &str) {
    if let Some(rest) = token.strip_prefix("--") {
        let (name, value) = rest.split_once('=').map(|(n, v)| (n, Some(v))).unwrap_or((rest, None));
        apply_long(store, name, value);
        return;
    }
    let Some(rest) = token.strip_prefix('-') else {
        return;
    };
    let mut chars = rest.chars().peekable();
    while let Some(letter) = chars.next() {
        let Some(desc) = store.descriptor(letter) else {
            tracing::warn!(target: "config", option = %letter, "unknown option in LESS/MORE");
            continue;
        };
        match desc.ty {
            OptionType::Bool => {
                let _ = store.set_bool(letter, true);
            }
            OptionType::Triple => {
                let _ = store.set_triple(letter, if letter.is_uppercase() { Triple::OnPlus } else { Triple::On });
            }
            OptionType::Numeric | OptionType::Str => {
                let arg: String = chars.by_ref().collect();
                if !arg.is_empty() {
                    apply_value(store, letter, &arg);
                }
                break;
            }
            OptionType::VariableLess => {}
        }
    }
}

fn apply_long(store: &mut OptionStore, name: &str, value: Option<&str>) {
    if store.find_long(name).is_err() {
        tracing::warn!(target: "config", option = name, "unknown long option in LESS/MORE");
        return;
    }
    // `OptionStore` resolves long names internally but every slot is keyed by
    // its short letter for `set_*`, so recover it by scanning the registry.
    let Some(letter) = short_for_long(store, name) else {
        return;
    };
    match value {
        Some(v) => apply_value(store, letter, v),
        None => match store.descriptor(letter).map(|d| d.ty) {
            Some(OptionType::Bool) => {
                let _ = store.set_bool(letter, true);
            }
            Some(OptionType::Triple) => {
                let _ = store.set_triple(letter, Triple::On);
            }
            _ => {}
        },
    }
}

fn short_for_long(store: &OptionStore, name: &str) -> Option<char> {
    "iNSxeFobgjm".chars().find(|&c| store.descriptor(c).map(|d| d.long_names.contains(&name)).unwrap_or(false))
}

fn apply_value(store: &mut OptionStore, letter: char, value: &str) {
    match store.descriptor(letter).map(|d| d.ty) {
        Some(OptionType::Numeric) => {
            let _ = store.set_numeric(letter, value);
        }
        Some(OptionType::Str) => {
            let _ = store.set_string(letter, value, None);
        }
        Some(OptionType::Bool) => {
            let _ = store.set_bool(letter, value != "0");
        }
        Some(OptionType::Triple) => {
            let _ = store.set_triple(letter, if value == "0" { Triple::Off } else { Triple::On });
        }
        _ => {}
    }
}

/// Apply parsed CLI flags onto `store`, the final and highest-priority layer.
pub fn apply_cli_options(store: &mut OptionStore, args: &Args) {
    if args.ignore_case {
        let _ = store.set_triple('i', Triple::On);
    }
    if args.ignore_case_plus {
        let _ = store.set_triple('i', Triple::OnPlus);
    }
    if args.line_numbers {
        let _ = store.set_bool('N', true);
    }
    if args.chop_long_lines {
        let _ = store.set_bool('S', true);
    }
    if let Some(tabs) = args.tabs {
        let _ = store.set_numeric('x', &tabs.to_string());
    }
    if args.quit_at_eof {
        let _ = store.set_triple('e', Triple::On);
    }
    if args.quit_if_one_screen {
        let _ = store.set_bool('F', true);
    }
    if let Some(log_file) = &args.log_file {
        let _ = store.set_string('o', log_file, None);
    }
    if args.long_prompt {
        let _ = store.set_triple('m', Triple::On);
    }
}

/// Apply a completed `-` prompt (`OptToggleRequest`) against `store`,
/// returning the status-line message to show for it. `sign` follows the
/// prompt grammar: `+`/`!` select the on-plus form of a triple option,
/// `-`/`_` (or its absence with no value) toggle or query in place.
pub fn apply_toggle_request(store: &mut OptionStore, req: &OptToggleRequest) -> String {
    let letter = match &req.name {
        OptName::Short(c) => *c,
        OptName::Long(name) => match short_for_long(store, name) {
            Some(c) => c,
            None => return format!("--{name}: no such option"),
        },
    };
    let Some(desc_ty) = store.descriptor(letter).map(|d| d.ty) else {
        return format!("{letter}: no such option");
    };
    if let Some(value) = &req.value {
        return match apply_value_checked(store, letter, value) {
            Ok(()) => format!("{letter} set to {value}"),
            Err(err) => err.to_string(),
        };
    }
    match req.sign {
        None => match store.query(letter) {
            Ok(v) => format!("{letter}: {}", describe(v)),
            Err(err) => err.to_string(),
        },
        Some(sign) => {
            let is_upper = matches!(sign, '+' | '!');
            match desc_ty {
                OptionType::Bool => match store.toggle_bool(letter) {
                    Ok(v) => format!("{letter} {}", if v { "on" } else { "off" }),
                    Err(err) => err.to_string(),
                },
                OptionType::Triple => match store.toggle_triple(letter, is_upper) {
                    Ok(v) => format!("{letter} {}", describe(&OptionValue::Triple(v))),
                    Err(err) => err.to_string(),
                },
                _ => match store.query(letter) {
                    Ok(v) => format!("{letter}: {}", describe(v)),
                    Err(err) => err.to_string(),
                },
            }
        }
    }
}

fn apply_value_checked(store: &mut OptionStore, letter: char, value: &str) -> Result<(), core_config::OptionError> {
    match store.descriptor(letter).map(|d| d.ty) {
        Some(OptionType::Numeric) => store.set_numeric(letter, value).map(|_| ()),
        Some(OptionType::Str) => store.set_string(letter, value, None).map(|_| ()),
        Some(OptionType::Bool) => store.set_bool(letter, value != "0"),
        Some(OptionType::Triple) => store.set_triple(letter, if value == "0" { Triple::Off } else { Triple::On }),
        _ => Ok(()),
    }
}

fn describe(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => if *b { "on" } else { "off" }.to_string(),
        OptionValue::Triple(Triple::Off) => "off".to_string(),
        OptionValue::Triple(Triple::On) => "on".to_string(),
        OptionValue::Triple(Triple::OnPlus) => "on-plus".to_string(),
        OptionValue::Numeric(core_config::Numeric::Int(n)) => n.to_string(),
        OptionValue::Numeric(core_config::Numeric::Frac(f)) => format!(".{f}"),
        OptionValue::Str(s) => s.clone(),
        OptionValue::None => String::new(),
    }
}
