//! Turns a filename (or stdin) into an open `FileState`, running it through
//! the `LESSOPEN` alternate-file protocol first.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use core_cache::{FileInput, FileState, OpenAction, PipeInput, SourceFlags, altfile_open};

/// An opened file's cache plus whatever housekeeping closing it later needs.
pub struct OpenedFile {
    pub state: FileState,
    pub display_name: String,
    /// Set when `LESSOPEN` substituted a replacement path, so `LESSCLOSE`
    /// can be run against the same pair on exit.
    pub altfile: Option<(PathBuf, PathBuf)>,
}

pub fn open_path(path: &Path, max_buffers: usize) -> Result<OpenedFile> {
    let lessopen = std::env::var("LESSOPEN").ok();
    match altfile_open(lessopen.as_deref(), path) {
        OpenAction::Passthrough => {
            let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            let flags = SourceFlags { can_seek: true, keep_open: true, popened: false, help: false };
            Ok(OpenedFile {
                state: FileState::new(Box::new(FileInput::new(file)), flags, max_buffers),
                display_name: path.display().to_string(),
                altfile: None,
            })
        }
        OpenAction::Piped(mut child) => {
            let stdout = child.stdout.take().context("preprocessor produced no stdout")?;
            let flags = SourceFlags { can_seek: false, keep_open: false, popened: true, help: false };
            Ok(OpenedFile {
                state: FileState::new(Box::new(PipeInput::new(Box::new(stdout))), flags, max_buffers),
                display_name: path.display().to_string(),
                altfile: None,
            })
        }
        OpenAction::Replaced(replacement) => {
            let file = File::open(&replacement)
                .with_context(|| format!("cannot open substituted file {}", replacement.display()))?;
            let flags = SourceFlags { can_seek: true, keep_open: true, popened: false, help: false };
            Ok(OpenedFile {
                state: FileState::new(Box::new(FileInput::new(file)), flags, max_buffers),
                display_name: path.display().to_string(),
                altfile: Some((path.to_path_buf(), replacement)),
            })
        }
    }
}

pub fn open_stdin(max_buffers: usize) -> OpenedFile {
    let flags = SourceFlags { can_seek: false, keep_open: false, popened: false, help: false };
    let reader: Box<dyn Read + Send> = Box::new(BufReader::new(std::io::stdin()));
    OpenedFile {
        state: FileState::new(Box::new(PipeInput::new(reader)), flags, max_buffers),
        display_name: "(standard input)".to_string(),
        altfile: None,
    }
}

/// Run `LESSCLOSE` for a file opened through the substitution form of
/// `LESSOPEN`, if any.
pub fn close_altfile(opened: &OpenedFile) {
    if let Some((original, replacement)) = &opened.altfile {
        let lessclose = std::env::var("LESSCLOSE").ok();
        core_cache::altfile_close(lessclose.as_deref(), original, replacement);
    }
}
