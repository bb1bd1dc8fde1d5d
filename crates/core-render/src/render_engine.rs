//! Drives the terminal from a set of already-rendered display rows.
//!
//! The engine owns nothing about file content: callers (the command
//! dispatcher) ask the cache and `core_text::render_line` for the rows that
//! belong in the text area and hand them here as `DisplayRow`s. This keeps
//! scrolling, highlighting, and status-line placement independent of how the
//! bytes were produced, the same separation the teacher draws between frame
//! assembly and the editor's rope buffer.

use crate::partial_metrics::{RenderPathMetrics, RenderPathMetricsSnapshot};
use crate::style::{StyleAttr, StyleLayer};
use crate::viewport::{DisplayRow, ScreenPosition};
use crate::writer::Writer;
use anyhow::Result;
use core_terminal::TerminalCapabilities;
use core_text::{CellAttr, Output};

pub struct RenderEngine {
    position: ScreenPosition,
    metrics: RenderPathMetrics,
    capabilities: TerminalCapabilities,
    prev_status: String,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine {
    pub fn new() -> Self {
        Self {
            position: ScreenPosition::new(0),
            metrics: RenderPathMetrics::default(),
            capabilities: TerminalCapabilities::detect(),
            prev_status: String::new(),
        }
    }

    pub fn capabilities(&self) -> TerminalCapabilities {
        self.capabilities
    }

    pub fn position(&self) -> &ScreenPosition {
        &self.position
    }

    pub fn metrics_snapshot(&self) -> RenderPathMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Forget cached rows: forces the next frame to be a full repaint.
    pub fn invalidate_for_resize(&mut self) {
        self.position = ScreenPosition::new(0);
        use std::sync::atomic::Ordering::Relaxed;
        self.metrics.resize_invalidations.fetch_add(1, Relaxed);
    }

    /// Repaint the whole text area plus the status line.
    pub fn render_full(
        &mut self,
        rows: Vec<DisplayRow>,
        highlights: &StyleLayer,
        status: &str,
        w: u16,
        h: u16,
    ) -> Result<()> {
        let start = std::time::Instant::now();
        let mut writer = Writer::new();
        for (row_idx, row) in rows.iter().enumerate() {
            if (row_idx as u16) >= h.saturating_sub(1) {
                break;
            }
            paint_row(&mut writer, row, highlights, row_idx, w);
        }
        self.write_status(&mut writer, status, h);
        writer.flush()?;
        self.position.set_width(w);
        self.position.set_rows(rows);
        use std::sync::atomic::Ordering::Relaxed;
        self.metrics.full_frames.fetch_add(1, Relaxed);
        self.metrics
            .rows_repainted
            .fetch_add(self.position.height() as u64, Relaxed);
        self.metrics
            .last_full_render_ns
            .store(start.elapsed().as_nanos() as u64, Relaxed);
        Ok(())
    }

    /// Repaint after scrolling by `delta` screen rows (positive = forward,
    /// negative = backward). `new_rows` is the complete row set for the new
    /// viewport; only the rows entering the screen are actually repainted,
    /// the rest are assumed already on screen courtesy of the terminal's
    /// own scroll-region shift.
    pub fn render_scroll(
        &mut self,
        new_rows: Vec<DisplayRow>,
        delta: i32,
        highlights: &StyleLayer,
        status: &str,
        w: u16,
        h: u16,
    ) -> Result<()> {
        use std::sync::atomic::Ordering::Relaxed;
        if delta == 0 {
            return self.render_status_only(status, h);
        }
        let text_height = h.saturating_sub(1);
        let visible_rows = new_rows.len();
        let entering = delta.unsigned_abs() as usize;

        let degenerate = entering >= visible_rows
            || !self.capabilities.supports_scroll_region
            || self.position.width() != w
            || self.position.height() != visible_rows;
        if degenerate {
            self.metrics.scroll_degraded_full.fetch_add(1, Relaxed);
            return self.render_full(new_rows, highlights, status, w, h);
        }

        let start = std::time::Instant::now();
        let mut writer = Writer::new();
        writer.print(format!("\x1b[1;{}r", text_height));
        if delta > 0 {
            writer.print(format!("\x1b[{}S", delta));
            for i in 0..entering {
                let row_idx = visible_rows - entering + i;
                paint_row(&mut writer, &new_rows[row_idx], highlights, row_idx, w);
            }
        } else {
            let amt = -delta;
            writer.print(format!("\x1b[{}T", amt));
            for row_idx in 0..entering {
                paint_row(&mut writer, &new_rows[row_idx], highlights, row_idx, w);
            }
        }
        writer.print("\x1b[r");
        self.write_status(&mut writer, status, h);
        writer.flush()?;

        self.metrics.scroll_frames.fetch_add(1, Relaxed);
        self.metrics.rows_repainted.fetch_add(entering as u64, Relaxed);
        self.metrics
            .rows_reused
            .fetch_add((visible_rows - entering) as u64, Relaxed);
        self.metrics
            .last_partial_render_ns
            .store(start.elapsed().as_nanos() as u64, Relaxed);

        self.position.set_rows(new_rows);
        Ok(())
    }

    /// Repaint only the status/prompt line: a message was posted or the
    /// prompt buffer changed, content on screen is unaffected.
    pub fn render_status_only(&mut self, status: &str, h: u16) -> Result<()> {
        use std::sync::atomic::Ordering::Relaxed;
        if status == self.prev_status {
            self.metrics.status_skipped.fetch_add(1, Relaxed);
            return Ok(());
        }
        let mut writer = Writer::new();
        self.write_status(&mut writer, status, h);
        writer.flush()?;
        self.metrics.status_only_frames.fetch_add(1, Relaxed);
        Ok(())
    }

    fn write_status(&mut self, writer: &mut Writer, status: &str, h: u16) {
        if h == 0 {
            return;
        }
        let y = h - 1;
        writer.move_to(0, y);
        writer.clear_line(0, y);
        writer.print(format!("\x1b[7m{status}\x1b[0m"));
        self.prev_status = status.to_string();
    }
}

fn paint_row(writer: &mut Writer, row: &DisplayRow, highlights: &StyleLayer, row_idx: usize, w: u16) {
    writer.move_to(0, row_idx as u16);
    writer.clear_line(0, row_idx as u16);
    let mut col: u16 = 0;
    for out in &row.rendered.output {
        if col >= w {
            break;
        }
        match out {
            Output::Cell(cell) => {
                let highlighted = highlights
                    .matches_on_row(row_idx)
                    .any(|s| col >= s.start_col && col < s.end_col && s.attr == StyleAttr::SearchMatch);
                if highlighted || !cell.attr.is_empty() {
                    let mut codes: Vec<&str> = Vec::new();
                    if highlighted {
                        codes.push("7");
                    }
                    if cell.attr.contains(CellAttr::BOLD) {
                        codes.push("1");
                    }
                    if cell.attr.contains(CellAttr::UNDERLINE) {
                        codes.push("4");
                    }
                    if cell.attr.contains(CellAttr::STANDOUT) {
                        codes.push("7");
                    }
                    if cell.attr.contains(CellAttr::BLINK) {
                        codes.push("5");
                    }
                    writer.print(format!("\x1b[{}m{}\x1b[0m", codes.join(";"), cell.text));
                } else {
                    writer.print(cell.text.clone());
                }
                col = col.saturating_add(cell.width);
            }
            Output::Escape(esc) => {
                writer.print(String::from_utf8_lossy(&esc.0).into_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::{Cell, RenderedLine};

    fn row(start: u64, end: u64, text: &str) -> DisplayRow {
        DisplayRow {
            start,
            end,
            line_number: Some(start + 1),
            rendered: RenderedLine {
                output: vec![Output::Cell(Cell {
                    text: text.to_string(),
                    width: text.chars().count() as u16,
                    attr: CellAttr::empty(),
                })],
                consumed: text.len(),
                truncated: false,
                ended_in_newline: true,
            },
        }
    }

    #[test]
    fn full_render_populates_position_table() {
        let mut eng = RenderEngine::new();
        let rows = vec![row(0, 5, "alpha"), row(5, 9, "beta")];
        let highlights = StyleLayer::new();
        eng.render_full(rows, &highlights, "status", 20, 3).unwrap();
        assert_eq!(eng.position().height(), 2);
        assert_eq!(eng.position().top(), Some(0));
        assert_eq!(eng.metrics_snapshot().full_frames, 1);
    }

    #[test]
    fn small_scroll_takes_fast_path_when_cache_matches() {
        let mut eng = RenderEngine::new();
        let highlights = StyleLayer::new();
        let initial = vec![row(0, 2, "a"), row(2, 4, "b"), row(4, 6, "c")];
        eng.render_full(initial, &highlights, "status", 10, 4).unwrap();

        let scrolled = vec![row(2, 4, "b"), row(4, 6, "c"), row(6, 8, "d")];
        eng.render_scroll(scrolled, 1, &highlights, "status", 10, 4)
            .unwrap();
        let snap = eng.metrics_snapshot();
        assert_eq!(snap.scroll_frames, 1);
        assert_eq!(snap.scroll_degraded_full, 0);
        assert_eq!(eng.position().top(), Some(2));
    }

    #[test]
    fn scroll_bigger_than_viewport_degrades_to_full() {
        let mut eng = RenderEngine::new();
        let highlights = StyleLayer::new();
        let initial = vec![row(0, 2, "a"), row(2, 4, "b")];
        eng.render_full(initial, &highlights, "status", 10, 3).unwrap();

        let scrolled = vec![row(40, 42, "x"), row(42, 44, "y")];
        eng.render_scroll(scrolled, 20, &highlights, "status", 10, 3)
            .unwrap();
        let snap = eng.metrics_snapshot();
        assert_eq!(snap.scroll_degraded_full, 1);
        assert_eq!(snap.full_frames, 2);
    }

    #[test]
    fn resize_invalidation_forces_cold_cache() {
        let mut eng = RenderEngine::new();
        let highlights = StyleLayer::new();
        let rows = vec![row(0, 2, "a")];
        eng.render_full(rows, &highlights, "status", 10, 3).unwrap();
        eng.invalidate_for_resize();
        assert_eq!(eng.position().height(), 0);
        assert_eq!(eng.metrics_snapshot().resize_invalidations, 1);
    }

    #[test]
    fn status_only_skips_when_unchanged() {
        let mut eng = RenderEngine::new();
        let highlights = StyleLayer::new();
        let rows = vec![row(0, 2, "a")];
        eng.render_full(rows, &highlights, "status one", 10, 3).unwrap();
        eng.render_status_only("status one", 3).unwrap();
        assert_eq!(eng.metrics_snapshot().status_skipped, 1);
        eng.render_status_only("status two", 3).unwrap();
        assert_eq!(eng.metrics_snapshot().status_only_frames, 1);
    }
}
