//! Persisted history file: search/shell/examine history plus marks, written
//! to `$HOME/.lesshst` on a clean exit and reloaded on the next run.
//!
//! `core_actions::Prompt` has no external history-hook, so every history
//! list here is built by watching `NavCommand`s as they're dispatched
//! rather than through the prompt machinery itself.

use std::fs;
use std::path::{Path, PathBuf};

use core_cache::{FileId, IfileList, MarkTable};

const SEARCH_HEADER: &str = ".search";
const SHELL_HEADER: &str = ".shell";
const EXAMINE_HEADER: &str = ".examine";
const MARK_HEADER: &str = ".mark";
const MAX_ENTRIES: usize = 200;

#[derive(Default)]
pub struct History {
    pub search: Vec<String>,
    pub shell: Vec<String>,
    pub examine: Vec<String>,
}

impl History {
    pub fn record_search(&mut self, pattern: &str) {
        record(&mut self.search, pattern);
    }

    pub fn record_shell(&mut self, cmd: &str) {
        record(&mut self.shell, cmd);
    }

    pub fn record_examine(&mut self, path: &str) {
        record(&mut self.examine, path);
    }
}

fn record(list: &mut Vec<String>, entry: &str) {
    list.retain(|e| e != entry);
    list.push(entry.to_string());
    if list.len() > MAX_ENTRIES {
        list.remove(0);
    }
}

pub fn history_path() -> Option<PathBuf> {
    std::env::var_os("LESSHISTFILE").map(PathBuf::from).or_else(|| dirs::home_dir().map(|h| h.join(".lesshst")))
}

/// Load history and marks from `path`. A missing file is not an error.
pub fn load(path: &Path, marks: &mut MarkTable, ifiles: &mut IfileList) -> History {
    let mut history = History::default();
    let Ok(text) = fs::read_to_string(path) else {
        return history;
    };
    let mut section = "";
    for line in text.lines() {
        if line.starts_with('.') {
            section = line;
            continue;
        }
        match section {
            SEARCH_HEADER => history.search.push(line.to_string()),
            SHELL_HEADER => history.shell.push(line.to_string()),
            EXAMINE_HEADER => history.examine.push(line.to_string()),
            MARK_HEADER => parse_mark_line(line, marks, ifiles),
            _ => {}
        }
    }
    history
}

fn parse_mark_line(line: &str, marks: &mut MarkTable, ifiles: &mut IfileList) {
    // `m <letter> <screen-line> <file-offset> <filename>`
    let mut parts = line.splitn(5, ' ');
    let (Some("m"), Some(letter), Some(_screen_line), Some(offset), Some(filename)) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return;
    };
    let Some(letter) = letter.chars().next() else {
        return;
    };
    let Ok(pos) = offset.parse::<u64>() else {
        return;
    };
    let ifile = ifiles.open(FileId::Path(PathBuf::from(filename)));
    marks.set(letter, ifile, pos);
}

/// Write the current history and marks back to `path`.
pub fn save(path: &Path, history: &History, marks: &MarkTable, ifiles: &IfileList) -> std::io::Result<()> {
    let mut out = String::new();
    out.push_str(SEARCH_HEADER);
    out.push('\n');
    for entry in &history.search {
        out.push_str(entry);
        out.push('\n');
    }
    out.push_str(SHELL_HEADER);
    out.push('\n');
    for entry in &history.shell {
        out.push_str(entry);
        out.push('\n');
    }
    out.push_str(EXAMINE_HEADER);
    out.push('\n');
    for entry in &history.examine {
        out.push_str(entry);
        out.push('\n');
    }
    out.push_str(MARK_HEADER);
    out.push('\n');
    for (name, pos) in marks.iter() {
        let Some(entry) = ifiles.get(pos.ifile) else {
            continue;
        };
        out.push_str(&format!("m {} 0 {} {}\n", name, pos.pos, entry.id.display_name()));
    }
    fs::write(path, out)
}
