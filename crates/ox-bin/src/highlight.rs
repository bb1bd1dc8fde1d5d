//! Builds the per-frame search-match `StyleLayer` from the currently
//! displayed rows. `DisplayRow` only carries already-rendered cells, not the
//! raw line bytes, so matches are found against the reconstructed cell text
//! and then mapped back to visual columns via each cell's width.

use core_render::style::{StyleAttr, StyleLayer, StyleSpan};
use core_render::viewport::DisplayRow;
use core_text::Output;

pub fn build_highlights(rows: &[DisplayRow], search: Option<&core_actions::CompiledSearch>) -> StyleLayer {
    let mut layer = StyleLayer::new();
    let Some(search) = search else {
        return layer;
    };
    for (row_idx, row) in rows.iter().enumerate() {
        let mut text = String::new();
        // byte offset into `text` -> visual column at that offset
        let mut col_at_byte = Vec::new();
        let mut col = 0u16;
        for out in &row.rendered.output {
            if let Output::Cell(cell) = out {
                col_at_byte.push((text.len(), col));
                text.push_str(&cell.text);
                col = col.saturating_add(cell.width);
            }
        }
        col_at_byte.push((text.len(), col));
        for (start, end) in search.match_spans(&text) {
            let start_col = col_for_byte(&col_at_byte, start);
            let end_col = col_for_byte(&col_at_byte, end);
            if end_col > start_col {
                layer.push(StyleSpan {
                    line: row_idx,
                    start_col,
                    end_col,
                    attr: StyleAttr::SearchMatch,
                });
            }
        }
    }
    layer
}

fn col_for_byte(table: &[(usize, u16)], byte: usize) -> u16 {
    table
        .iter()
        .rev()
        .find(|(b, _)| *b <= byte)
        .map(|(_, c)| *c)
        .unwrap_or(0)
}
