//! The `find_line_number` query (spec §4.4 step 4): given a byte position,
//! find the nearest cached checkpoint and scan from there, counting
//! newlines, rather than rescanning from the start of the file. A scan that
//! runs past the wall-clock deadline aborts and the caller decides what to
//! do (spec says: surface a status message, and an interrupt during the
//! scan disables line numbers for the rest of the session).
use core_cache::{CacheResult, FileState, GetOutcome};
use core_linenum::{Checkpoint, LineNumCache, ScanDeadline};

/// Outcome of `find_line_number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineNumberLookup {
    Found(u64),
    /// The scan exceeded `SCAN_TIMEOUT` before reaching `pos`.
    TimedOut,
}

/// Compute the 1-based line number containing `pos`, inserting whatever new
/// checkpoint the scan discovers so later lookups near `pos` are cheap.
pub fn find_line_number(
    file: &mut FileState,
    cache: &mut LineNumCache,
    pos: u64,
) -> CacheResult<LineNumberLookup> {
    if pos == 0 {
        return Ok(LineNumberLookup::Found(1));
    }
    let before = cache.nearest_before(pos);
    let after = cache.nearest_after(pos);
    let (anchor, forward) = match after {
        Some(a) if pos.saturating_sub(before.pos) > a.pos.saturating_sub(pos) => (a, false),
        _ => (before, true),
    };
    let deadline = ScanDeadline::start();
    if forward {
        let mut line = anchor.line;
        file.seek(anchor.pos)?;
        let mut at = anchor.pos;
        while at < pos {
            if deadline.expired() {
                return Ok(LineNumberLookup::TimedOut);
            }
            match file.forward_get()? {
                GetOutcome::Byte(b) => {
                    at += 1;
                    if b == b'\n' {
                        line += 1;
                    }
                }
                GetOutcome::End => break,
            }
        }
        cache.insert(Checkpoint { pos, line });
        Ok(LineNumberLookup::Found(line))
    } else {
        let mut line = anchor.line;
        file.seek(anchor.pos)?;
        let mut at = anchor.pos;
        while at > pos {
            if deadline.expired() {
                return Ok(LineNumberLookup::TimedOut);
            }
            match file.backward_get()? {
                GetOutcome::Byte(b) => {
                    at -= 1;
                    if b == b'\n' {
                        line -= 1;
                    }
                }
                GetOutcome::End => break,
            }
        }
        cache.insert(Checkpoint { pos, line });
        Ok(LineNumberLookup::Found(line))
    }
}

/// The symmetric query to `find_line_number`: the byte position where
/// 1-based `line` starts. Picks the nearest checkpoint by line-number
/// distance and scans counting newlines instead of bytes.
pub fn find_position(
    file: &mut FileState,
    cache: &mut LineNumCache,
    line: u64,
) -> CacheResult<LineNumberLookup> {
    if line <= 1 {
        return Ok(LineNumberLookup::Found(0));
    }
    let before = cache.nearest_before_line(line);
    let after = cache.nearest_after_line(line);
    let (anchor, forward) = match after {
        Some(a) if line.saturating_sub(before.line) > a.line.saturating_sub(line) => (a, false),
        _ => (before, true),
    };
    let deadline = ScanDeadline::start();
    let mut cur_line = anchor.line;
    file.seek(anchor.pos)?;
    let mut at = anchor.pos;
    if forward {
        while cur_line < line {
            if deadline.expired() {
                return Ok(LineNumberLookup::TimedOut);
            }
            match file.forward_get()? {
                GetOutcome::Byte(b) => {
                    at += 1;
                    if b == b'\n' {
                        cur_line += 1;
                    }
                }
                GetOutcome::End => break,
            }
        }
    } else {
        while cur_line > line {
            if deadline.expired() {
                return Ok(LineNumberLookup::TimedOut);
            }
            match file.backward_get()? {
                GetOutcome::Byte(b) => {
                    at -= 1;
                    if b == b'\n' {
                        cur_line -= 1;
                    }
                }
                GetOutcome::End => break,
            }
        }
    }
    cache.insert(Checkpoint { pos: at, line: cur_line });
    Ok(LineNumberLookup::Found(at))
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
    fn position_zero_is_always_line_one() {
        let mut f = file_of("a\nb\nc\n");
        let mut cache = LineNumCache::new(200);
        assert_eq!(find_line_number(&mut f, &mut cache, 0).unwrap(), LineNumberLookup::Found(1));
    }

    #[test]
    fn scans_forward_from_nearest_checkpoint() {
        let mut f = file_of("a\nb\nc\nd\n");
        let mut cache = LineNumCache::new(200);
        let found = find_line_number(&mut f, &mut cache, 6).unwrap();
        assert_eq!(found, LineNumberLookup::Found(4));
    }

    #[test]
    fn repeated_lookup_reuses_inserted_checkpoint() {
        let mut f = file_of("a\nb\nc\nd\ne\n");
        let mut cache = LineNumCache::new(200);
        find_line_number(&mut f, &mut cache, 8).unwrap();
        assert_eq!(cache.len(), 2);
        let found = find_line_number(&mut f, &mut cache, 8).unwrap();
        assert_eq!(found, LineNumberLookup::Found(5));
    }

    #[test]
    fn find_position_is_symmetric_with_find_line_number() {
        let mut f = file_of("a\nb\nc\nd\ne\n");
        let mut cache = LineNumCache::new(200);
        let pos = find_position(&mut f, &mut cache, 4).unwrap();
        assert_eq!(pos, LineNumberLookup::Found(6));
        let line = find_line_number(&mut f, &mut cache, 6).unwrap();
        assert_eq!(line, LineNumberLookup::Found(4));
    }

    #[test]
    fn find_position_of_line_one_is_zero() {
        let mut f = file_of("a\nb\nc\n");
        let mut cache = LineNumCache::new(200);
        assert_eq!(find_position(&mut f, &mut cache, 1).unwrap(), LineNumberLookup::Found(0));
    }
}
