//! Status line composition: the bottom row shows either a prompt awaiting
//! input, an ephemeral message, or the default file/position summary. A
//! two-stage pipeline — `compose_status` builds ordered segments,
//! `format_status` renders them to a string — keeps the three cases testable
//! independently of final string layout.

/// What we need to know to render the status line for one frame.
pub struct StatusContext<'a> {
    pub file_name: Option<&'a str>,
    pub file_index: Option<(usize, usize)>,
    /// 1-based first/last displayed line and, if known, the total line count.
    /// The total is `None` until the line-number cache (or a full scan) has
    /// established it — shown as `?` rather than guessed.
    pub line_range: Option<(u64, u64, Option<u64>)>,
    pub byte_percent: Option<u8>,
    pub at_eof: bool,
    /// A colon/search/shell prompt currently capturing keystrokes, already
    /// including its leading character (`:`, `/`, `?`, `=`, ...).
    pub prompt: Option<&'a str>,
    /// A transient message (error, `:f` result, search wrap notice) that
    /// overrides the default summary until it expires or input begins.
    pub message: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    Prompt(&'a str),
    Message(&'a str),
    FileName(&'a str),
    FileIndex(usize, usize),
    LineRange(u64, u64, Option<u64>),
    Percent(u8),
    Eof,
}

pub fn compose_status<'a>(ctx: &'a StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    if let Some(prompt) = ctx.prompt {
        return vec![StatusSegment::Prompt(prompt)];
    }
    if let Some(msg) = ctx.message {
        return vec![StatusSegment::Message(msg)];
    }
    let mut out = Vec::with_capacity(6);
    out.push(StatusSegment::FileName(ctx.file_name.unwrap_or("(standard input)")));
    if let Some((idx, total)) = ctx.file_index {
        if total > 1 {
            out.push(StatusSegment::FileIndex(idx, total));
        }
    }
    if let Some((first, last, total)) = ctx.line_range {
        out.push(StatusSegment::LineRange(first, last, total));
    }
    if ctx.at_eof {
        out.push(StatusSegment::Eof);
    } else if let Some(p) = ctx.byte_percent {
        out.push(StatusSegment::Percent(p));
    }
    out
}

pub fn format_status(segments: &[StatusSegment<'_>]) -> String {
    use std::fmt::Write as _;
    if let [StatusSegment::Prompt(p)] = segments {
        return p.to_string();
    }
    if let [StatusSegment::Message(m)] = segments {
        return m.to_string();
    }
    let mut s = String::with_capacity(48);
    for seg in segments {
        match seg {
            StatusSegment::FileName(name) => s.push_str(name),
            StatusSegment::FileIndex(idx, total) => {
                let _ = write!(s, " (file {} of {})", idx, total);
            }
            StatusSegment::LineRange(first, last, total) => {
                let _ = write!(s, " lines {}-{}", first, last);
                match total {
                    Some(t) => {
                        let _ = write!(s, "/{}", t);
                    }
                    None => s.push_str("/?"),
                }
            }
            StatusSegment::Percent(p) => {
                let _ = write!(s, " {}%", p);
            }
            StatusSegment::Eof => s.push_str(" (END)"),
            StatusSegment::Prompt(_) | StatusSegment::Message(_) => {}
        }
    }
    s
}

pub fn build_status(ctx: &StatusContext) -> String {
    format_status(&compose_status(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_takes_over_the_whole_line() {
        let ctx = StatusContext {
            file_name: Some("a.txt"),
            file_index: None,
            line_range: Some((1, 24, Some(100))),
            byte_percent: Some(10),
            at_eof: false,
            prompt: Some("/"),
            message: None,
        };
        assert_eq!(build_status(&ctx), "/");
    }

    #[test]
    fn message_overrides_default_summary() {
        let ctx = StatusContext {
            file_name: Some("a.txt"),
            file_index: None,
            line_range: None,
            byte_percent: None,
            at_eof: false,
            prompt: None,
            message: Some("Pattern not found"),
        };
        assert_eq!(build_status(&ctx), "Pattern not found");
    }

    #[test]
    fn default_summary_shows_name_range_and_percent() {
        let ctx = StatusContext {
            file_name: Some("a.txt"),
            file_index: None,
            line_range: Some((1, 24, Some(100))),
            byte_percent: Some(20),
            at_eof: false,
            prompt: None,
            message: None,
        };
        assert_eq!(build_status(&ctx), "a.txt lines 1-24/100 20%");
    }

    #[test]
    fn unknown_total_renders_as_question_mark() {
        let ctx = StatusContext {
            file_name: Some("a.txt"),
            file_index: None,
            line_range: Some((1, 24, None)),
            byte_percent: Some(5),
            at_eof: false,
            prompt: None,
            message: None,
        };
        assert_eq!(build_status(&ctx), "a.txt lines 1-24/? 5%");
    }

    #[test]
    fn eof_replaces_percent_with_end_marker() {
        let ctx = StatusContext {
            file_name: Some("a.txt"),
            file_index: None,
            line_range: Some((80, 100, Some(100))),
            byte_percent: Some(100),
            at_eof: true,
            prompt: None,
            message: None,
        };
        assert_eq!(build_status(&ctx), "a.txt lines 80-100/100 (END)");
    }

    #[test]
    fn multiple_files_shows_index() {
        let ctx = StatusContext {
            file_name: Some("b.txt"),
            file_index: Some((2, 3)),
            line_range: Some((1, 10, Some(10))),
            byte_percent: Some(100),
            at_eof: true,
            prompt: None,
            message: None,
        };
        assert_eq!(build_status(&ctx), "b.txt (file 2 of 3) lines 1-10/10 (END)");
    }
}
