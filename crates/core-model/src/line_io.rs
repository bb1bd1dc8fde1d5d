//! Raw-line scanning over a `core_cache::FileState`: the glue between the
//! byte-level cursor and `core_text::render_line`, which wants one whole
//! "raw" line (up to and including its terminating `\n`) at a time.

use core_cache::{CacheResult, FileState, GetOutcome};

/// Read forward from `start` up to and including the next `\n`, or to
/// end-of-stream. Returns the raw bytes and the position just past what was
/// read. `None` means `start` was already at end-of-stream (nothing to show).
pub fn read_line_forward(file: &mut FileState, start: u64) -> CacheResult<Option<(Vec<u8>, u64)>> {
    file.seek(start)?;
    let mut buf = Vec::new();
    loop {
        match file.forward_get()? {
            GetOutcome::Byte(b) => {
                buf.push(b);
                if b == b'\n' {
                    break;
                }
            }
            GetOutcome::End => break,
        }
    }
    if buf.is_empty() {
        return Ok(None);
    }
    Ok(Some((buf, file.tell())))
}

/// `pos` is assumed to be the start of some line. Scan backward past the
/// `\n` that terminates the *preceding* line to find where that preceding
/// line itself starts (0 if there's no earlier line). Used to assemble the
/// previous display row for backward scrolling.
pub fn line_start_before(file: &mut FileState, pos: u64) -> CacheResult<u64> {
    if pos == 0 {
        return Ok(0);
    }
    file.seek(pos)?;
    let mut passed_own_terminator = false;
    loop {
        match file.backward_get()? {
            GetOutcome::Byte(b) => {
                let at = file.tell();
                if b == b'\n' {
                    if passed_own_terminator {
                        return Ok(at + 1);
                    }
                    passed_own_terminator = true;
                }
            }
            GetOutcome::End => return Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_cache::source::{SourceFlags, StaticInput};

    fn file_of(text: &'static str) -> FileState {
        let input = Box::new(StaticInput::new(text.as_bytes()));
        FileState::new(
            input,
            SourceFlags { can_seek: true, keep_open: true, popened: false, help: false },
            64,
        )
    }

    #[test]
    fn reads_one_line_including_newline() {
        let mut f = file_of("first\nsecond\n");
        let (line, end) = read_line_forward(&mut f, 0).unwrap().unwrap();
        assert_eq!(line, b"first\n");
        assert_eq!(end, 6);
    }

    #[test]
    fn reads_final_unterminated_line() {
        let mut f = file_of("first\nsecond");
        let (line, _) = read_line_forward(&mut f, 6).unwrap().unwrap();
        assert_eq!(line, b"second");
    }

    #[test]
    fn returns_none_at_end_of_stream() {
        let mut f = file_of("first\n");
        assert!(read_line_forward(&mut f, 6).unwrap().is_none());
    }

    #[test]
    fn line_start_before_finds_previous_newline() {
        let mut f = file_of("first\nsecond\nthird\n");
        assert_eq!(line_start_before(&mut f, 13).unwrap(), 6);
        assert_eq!(line_start_before(&mut f, 6).unwrap(), 0);
    }
}
