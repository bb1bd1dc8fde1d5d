//! The screen position table: maps each currently displayed terminal row to
//! the file byte range whose rendered content occupies it. Scrolling forward
//! or backward, answering "what line number is row N", and computing the
//! status line's byte percentage all read from this table rather than
//! re-deriving position from the cache on every query.

use core_text::RenderedLine;

/// One displayed row: the half-open `[start, end)` file byte range it was
/// rendered from, plus the already-rendered cells ready for the writer.
#[derive(Debug, Clone)]
pub struct DisplayRow {
    pub start: u64,
    pub end: u64,
    pub line_number: Option<u64>,
    pub rendered: RenderedLine,
}

/// The rows currently occupying the text area (everything above the status
/// line). Rebuilt wholesale on `Full` repaints; reused in place for
/// scroll-shift repaints (see `render_engine::render_scroll`).
#[derive(Debug, Default)]
pub struct ScreenPosition {
    rows: Vec<DisplayRow>,
    width: u16,
}

impl ScreenPosition {
    pub fn new(width: u16) -> Self {
        Self {
            rows: Vec::new(),
            width,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    pub fn set_rows(&mut self, rows: Vec<DisplayRow>) {
        self.rows = rows;
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn top(&self) -> Option<u64> {
        self.rows.first().map(|r| r.start)
    }

    pub fn bottom(&self) -> Option<u64> {
        self.rows.last().map(|r| r.end)
    }

    pub fn first_line_number(&self) -> Option<u64> {
        self.rows.first().and_then(|r| r.line_number)
    }

    pub fn last_line_number(&self) -> Option<u64> {
        self.rows.last().and_then(|r| r.line_number)
    }

    /// The row index whose byte range contains `pos`, if any row is showing it.
    pub fn row_containing(&self, pos: u64) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| pos >= r.start && (pos < r.end || r.start == r.end))
    }

    /// True once the last displayed row reaches or passes the known file size.
    pub fn is_at_eof(&self, file_size: Option<u64>) -> bool {
        match (self.bottom(), file_size) {
            (Some(b), Some(sz)) => b >= sz,
            _ => false,
        }
    }

    /// Percentage of the file consumed by the bottom of the displayed area.
    /// `None` when the file size isn't known yet (unscanned pipe/stream).
    pub fn percent(&self, file_size: Option<u64>) -> Option<u8> {
        let sz = file_size?;
        if sz == 0 {
            return Some(100);
        }
        let b = self.bottom()?;
        Some(((b.min(sz) as u128 * 100) / sz as u128) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::{CellAttr, Output};

    fn dummy_rendered() -> RenderedLine {
        RenderedLine {
            output: vec![Output::Cell(core_text::Cell {
                text: "x".to_string(),
                width: 1,
                attr: CellAttr::empty(),
            })],
            consumed: 1,
            truncated: false,
            ended_in_newline: true,
        }
    }

    fn row(start: u64, end: u64, line: u64) -> DisplayRow {
        DisplayRow {
            start,
            end,
            line_number: Some(line),
            rendered: dummy_rendered(),
        }
    }

    #[test]
    fn empty_table_has_no_top_or_bottom() {
        let sp = ScreenPosition::new(80);
        assert_eq!(sp.top(), None);
        assert_eq!(sp.bottom(), None);
        assert!(!sp.is_at_eof(Some(100)));
    }

    #[test]
    fn row_containing_finds_the_right_row() {
        let mut sp = ScreenPosition::new(80);
        sp.set_rows(vec![row(0, 10, 1), row(10, 25, 2), row(25, 25, 3)]);
        assert_eq!(sp.row_containing(5), Some(0));
        assert_eq!(sp.row_containing(10), Some(1));
        assert_eq!(sp.row_containing(24), Some(1));
        assert_eq!(sp.row_containing(25), Some(2));
        assert_eq!(sp.row_containing(1000), None);
    }

    #[test]
    fn eof_and_percent_track_file_size() {
        let mut sp = ScreenPosition::new(80);
        sp.set_rows(vec![row(0, 40, 1), row(40, 100, 2)]);
        assert!(sp.is_at_eof(Some(100)));
        assert!(!sp.is_at_eof(Some(200)));
        assert_eq!(sp.percent(Some(200)), Some(50));
        assert_eq!(sp.percent(None), None);
    }

    #[test]
    fn percent_on_empty_file_is_complete() {
        let sp = ScreenPosition::new(80);
        assert_eq!(sp.percent(Some(0)), Some(100));
    }
}
