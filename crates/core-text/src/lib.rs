//! Turns raw bytes from the block cache into display-ready cells: grapheme
//! segmentation and width, tab/control-byte/ANSI rendering, and the
//! grapheme-boundary helpers the command dispatcher uses for search-match
//! highlighting and horizontal scroll arithmetic.

pub mod render;
pub mod segment;
pub mod width;
#[cfg(feature = "term-probe")]
pub mod width_probe;

pub use render::{BinaryFormat, Cell, CellAttr, Output, RawEscape, RenderConfig, RenderedLine, render_line};
pub use width::egc_width;

/// Grapheme and width utilities operating on a single already-decoded line.
pub mod grapheme {
    use crate::egc_width;
    use unicode_segmentation::UnicodeSegmentation;

    pub fn iter(line: &str) -> impl Iterator<Item = &str> {
        line.graphemes(true)
    }

    /// Previous grapheme boundary (returns 0 if already at or below the
    /// first boundary).
    pub fn prev_boundary(line: &str, byte: usize) -> usize {
        if byte == 0 || byte > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary (returns `line.len()` if at or beyond the end).
    pub fn next_boundary(line: &str, byte: usize) -> usize {
        if byte >= line.len() {
            return line.len();
        }
        for (idx, _) in line.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        line.len()
    }

    /// Visual column (terminal cells) up to, but not including, `byte`.
    pub fn visual_col(line: &str, byte: usize) -> usize {
        let mut col = 0;
        for (idx, g) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            col += egc_width(g) as usize;
        }
        col
    }

    pub fn cluster_width(g: &str) -> usize {
        egc_width(g) as usize
    }

    pub fn is_word(g: &str) -> bool {
        g.chars()
            .next()
            .map(|c| c == '_' || c.is_alphanumeric())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::grapheme;

    #[test]
    fn grapheme_basic_emoji() {
        let s = "a😀b";
        let bytes_a = 0;
        let bytes_emoji = grapheme::next_boundary(s, grapheme::next_boundary(s, bytes_a));
        assert_eq!(
            grapheme::prev_boundary(s, bytes_emoji),
            grapheme::next_boundary(s, bytes_a)
        );
        let vcol_emoji = grapheme::visual_col(s, bytes_emoji);
        assert!(vcol_emoji >= 1);
    }

    #[test]
    fn grapheme_combining_mark() {
        let s = "e\u{0301}";
        let nb = grapheme::next_boundary(s, 0);
        assert_eq!(nb, s.len());
        assert_eq!(grapheme::prev_boundary(s, nb), 0);
    }

    #[test]
    fn grapheme_cjk() {
        let s = "汉字";
        let first = grapheme::next_boundary(s, 0);
        let second = grapheme::next_boundary(s, first);
        assert!(second <= s.len());
        assert_eq!(grapheme::prev_boundary(s, second), first);
    }

    #[test]
    fn visual_col_is_non_decreasing() {
        let s = "a😀e\u{0301}汉字Z";
        let mut b = 0;
        let mut last_col = 0;
        while b < s.len() {
            let next = grapheme::next_boundary(s, b);
            let col = grapheme::visual_col(s, next);
            assert!(col >= last_col);
            last_col = col;
            b = next;
        }
    }
}
