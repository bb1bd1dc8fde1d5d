//! Resolves and loads a user key-binding file (the `lesskey` binary format),
//! then assembles the full `Dispatcher`: the user's table pushed first so it
//! shadows the built-in bindings, per `core_actions::default_command_table`'s
//! documented push order.

use std::path::PathBuf;

use core_keymap::Dispatcher;

pub fn resolve_keyfile_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(PathBuf::from(p));
    }
    if let Some(p) = std::env::var_os("LESSKEYFILE") {
        return Some(PathBuf::from(p));
    }
    dirs::home_dir().map(|h| h.join(".less"))
}

pub fn load_dispatcher(keyfile: Option<&str>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    if let Some(path) = resolve_keyfile_path(keyfile) {
        if let Ok(bytes) = std::fs::read(&path) {
            match core_keymap::keyfile::decode(&bytes) {
                Ok(keyfile) => {
                    if let Some(table) = keyfile.command_table {
                        dispatcher.push_table(table);
                    }
                }
                Err(err) => {
                    tracing::warn!(target: "keymap", path = %path.display(), ?err, "failed to decode key binding file");
                }
            }
        }
    }
    dispatcher.push_table(core_actions::default_command_table());
    dispatcher
}
