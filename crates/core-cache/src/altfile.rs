//! The alternate-file protocol: `LESSOPEN`/`LESSCLOSE` let an
//! external preprocessor substitute what actually gets displayed for a given
//! filename — decompressing an archive member, rendering a man page, etc.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// What `LESSOPEN` told us to do with a given filename.
pub enum OpenAction {
    /// No preprocessor configured, or it declined this file: read the
    /// filename directly.
    Passthrough,
    /// Pipe form (`LESSOPEN="|cmd %s"`): the command's stdout *is* the
    /// content to display, read directly rather than through a temp file.
    Piped(std::process::Child),
    /// Filename-substitution form (`LESSOPEN="cmd %s"`): the command printed
    /// a replacement path on its first line of stdout.
    Replaced(PathBuf),
}

/// Substitutes the first `%s` in `template` with `filename`, or appends the
/// filename as a final argument if no `%s` is present — matching less's
/// historical leniency toward malformed `LESSOPEN` strings.
fn substitute(template: &str, filename: &str) -> String {
    if template.contains("%s") {
        template.replacen("%s", filename, 1)
    } else {
        format!("{template} {filename}")
    }
}

/// Runs the command configured in `LESSOPEN` against `filename`, if any.
/// Never fails the caller: a broken or missing preprocessor just falls back
/// to the plain file.
pub fn open(lessopen: Option<&str>, filename: &Path) -> OpenAction {
    let Some(spec) = lessopen else {
        return OpenAction::Passthrough;
    };
    let filename_str = filename.to_string_lossy();
    let (piped, command_str) = match spec.strip_prefix('|') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    let cmdline = substitute(command_str, &filename_str);
    let mut parts = cmdline.split_whitespace();
    let Some(program) = parts.next() else {
        return OpenAction::Passthrough;
    };
    let mut cmd = Command::new(program);
    cmd.args(parts).stdout(Stdio::piped()).stderr(Stdio::null());

    if piped {
        match cmd.spawn() {
            Ok(child) => OpenAction::Piped(child),
            Err(_) => OpenAction::Passthrough,
        }
    } else {
        match cmd.output() {
            Ok(out) if out.status.success() => {
                let first_line = out
                    .stdout
                    .split(|&b| b == b'\n')
                    .next()
                    .unwrap_or(&[]);
                if first_line.is_empty() {
                    OpenAction::Passthrough
                } else {
                    OpenAction::Replaced(PathBuf::from(String::from_utf8_lossy(first_line).to_string()))
                }
            }
            _ => OpenAction::Passthrough,
        }
    }
}

/// Runs `LESSCLOSE` (if configured) when a substituted file is no longer
/// needed, passing both the original and replacement names so the
/// preprocessor can clean up a temp file it created.
pub fn close(lessclose: Option<&str>, original: &Path, replacement: &Path) {
    let Some(spec) = lessclose else { return };
    let orig_str = original.to_string_lossy();
    let repl_str = replacement.to_string_lossy();
    let with_orig = substitute(spec, &orig_str);
    let cmdline = substitute(&with_orig, &repl_str);
    let mut parts = cmdline.split_whitespace();
    let Some(program) = parts.next() else { return };
    let _ = Command::new(program)
        .args(parts)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_replaces_percent_s() {
        assert_eq!(substitute("cat %s", "file.gz"), "cat file.gz");
    }

    #[test]
    fn substitute_appends_when_no_percent_s() {
        assert_eq!(substitute("cat", "file.gz"), "cat file.gz");
    }

    #[test]
    fn no_lessopen_is_passthrough() {
        matches!(open(None, Path::new("a.txt")), OpenAction::Passthrough);
    }

    #[test]
    fn missing_program_falls_back_to_passthrough() {
        let action = open(Some("/no/such/binary-xyz %s"), Path::new("a.txt"));
        assert!(matches!(action, OpenAction::Passthrough));
    }

    #[test]
    fn pipe_form_is_detected() {
        let action = open(Some("|/bin/cat %s"), Path::new("a.txt"));
        assert!(matches!(action, OpenAction::Piped(_)));
    }
}
