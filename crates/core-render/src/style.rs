//! Style layer: a minimal abstraction for styling separate from `CellFlags`
//! so highlight passes (search matches, the status bar) can compose style
//! spans without rewriting emission logic.
//!
//! Design invariants:
//! * A `StyleSpan` never splits a grapheme cluster; callers must compute
//!   visual columns using the authoritative width engine before constructing
//!   spans.
//! * Spans are row-local (identified by `line`, a screen row index here, not
//!   a buffer line). Horizontal ranges use half-open `[start_col, end_col)`
//!   semantics in visual columns.
//! * Overlap semantics are undefined; later layers win when applied in order.
//! * No allocation churn: a single `StyleLayer` is reused per frame via
//!   `clear()`.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleAttr {
    /// A search-pattern match within displayed content.
    SearchMatch,
    /// The status/prompt bar's reverse-video presentation.
    StatusBar,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSpan {
    pub line: usize,
    pub start_col: u16, // inclusive
    pub end_col: u16,   // exclusive
    pub attr: StyleAttr,
}

impl StyleSpan {
    pub fn width(&self) -> u16 {
        self.end_col.saturating_sub(self.start_col)
    }
}

#[derive(Default, Debug)]
pub struct StyleLayer {
    pub spans: Vec<StyleSpan>,
}

impl StyleLayer {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }
    pub fn clear(&mut self) {
        self.spans.clear();
    }
    pub fn push(&mut self, span: StyleSpan) {
        self.spans.push(span);
    }
    pub fn matches_on_row(&self, line: usize) -> impl Iterator<Item = &StyleSpan> {
        self.spans
            .iter()
            .filter(move |s| s.line == line && matches!(s.attr, StyleAttr::SearchMatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn matches_on_row_filters_by_line_and_attr() {
        let mut layer = StyleLayer::new();
        layer.push(StyleSpan {
            line: 0,
            start_col: 1,
            end_col: 3,
            attr: StyleAttr::SearchMatch,
        });
        layer.push(StyleSpan {
            line: 1,
            start_col: 0,
            end_col: 80,
            attr: StyleAttr::StatusBar,
        });
        let found: Vec<_> = layer.matches_on_row(0).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].width(), 2);
        assert!(layer.matches_on_row(1).next().is_none());
    }
}
