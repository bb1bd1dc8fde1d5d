//! Turns a run of raw bytes from the block cache into display cells: tabs
//! expanded to stops, control bytes escaped, `ESC [ ... final` SGR sequences
//! passed through as zero-width attribute changes, and the classic
//! backspace-overstrike convention (`x\bx` bold, `_\bx` underline) folded
//! into a single attributed cell. Horizontal shift and the chop-long-lines
//! truncation point are both applied here, since both need a running column
//! count as bytes are consumed.

use crate::segment::segment_preserving;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellAttr: u8 {
        const BOLD      = 0b0001;
        const UNDERLINE = 0b0010;
        const STANDOUT  = 0b0100;
        const BLINK     = 0b1000;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub width: u16,
    pub attr: CellAttr,
}

/// A verbatim escape sequence to forward to the terminal unmodified. It
/// contributes no columns but must stay ordered relative to neighboring
/// cells (a color change mid-line, for instance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEscape(pub Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Cell(Cell),
    Escape(RawEscape),
}

/// How a single non-printable byte is rendered, mirroring the `LESSBINFMT`/
/// `LESSUTFBINFMT` environment variables: a prefix, the byte (or codepoint)
/// as uppercase hex, and a suffix.
#[derive(Debug, Clone)]
pub struct BinaryFormat {
    pub prefix: String,
    pub suffix: String,
}

impl Default for BinaryFormat {
    fn default() -> Self {
        Self {
            prefix: "<".to_string(),
            suffix: ">".to_string(),
        }
    }
}

impl BinaryFormat {
    fn render(&self, byte: u8) -> String {
        format!("{}{:02X}{}", self.prefix, byte, self.suffix)
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub tab_stop: u16,
    /// Columns already scrolled off the left edge (`RightArrow`/`LeftArrow`
    /// horizontal shift).
    pub shift: u16,
    pub max_cols: u16,
    /// If false, a line that overflows `max_cols` wraps onto further screen
    /// rows instead of being cut off; `render_line` always stops at one
    /// screen row's worth and reports how many bytes it consumed either way,
    /// so the caller folds wrapping into successive calls.
    pub chop_long_lines: bool,
    pub binary_fmt: BinaryFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tab_stop: 8,
            shift: 0,
            max_cols: 80,
            chop_long_lines: false,
            binary_fmt: BinaryFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderedLine {
    pub output: Vec<Output>,
    /// Bytes of `raw` this render consumed, including the trailing newline
    /// if one terminated the line within the scanned range.
    pub consumed: usize,
    /// True if a `$` truncation indicator belongs at the end of this row
    /// (chop-long-lines cut it off mid-line).
    pub truncated: bool,
    pub ended_in_newline: bool,
}

fn is_ansi_end_char(b: u8) -> bool {
    (0x40..=0x7e).contains(&b)
}

fn is_ansi_mid_char(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b';' | b':' | b'=' | b'?' | b'!' | b'"' | b'#' | b'$' | b'%' | b'&' | b'*' | b'+' | b'-' | b'.' | b'<' | b'>' | b' ')
}

/// If `raw[start..]` begins a CSI sequence (`ESC [`), scan to its final byte
/// and return the exclusive end index. Returns `None` for anything that
/// doesn't terminate within a reasonable scan (treated as a bare control
/// character instead, never silently swallowing unrelated text).
fn scan_csi(raw: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 2;
    let limit = raw.len().min(start + 64);
    while i < limit {
        let b = raw[i];
        if is_ansi_end_char(b) {
            return Some(i + 1);
        }
        if !is_ansi_mid_char(b) {
            return None;
        }
        i += 1;
    }
    None
}

/// Longest valid UTF-8 prefix of `raw` starting at `start`, or `None` if
/// `raw[start]` cannot begin a valid sequence at all (rendered as a single
/// binary byte instead).
fn decode_one_grapheme(raw: &[u8], start: usize) -> Option<(String, usize)> {
    for end in (start + 1..=raw.len()).rev() {
        if let Ok(s) = std::str::from_utf8(&raw[start..end]) {
            if let Some(g) = s.graphemes_safe_first() {
                return Some((g.to_string(), start + g.len()));
            }
        }
    }
    None
}

trait FirstGrapheme {
    fn graphemes_safe_first(&self) -> Option<&str>;
}

impl FirstGrapheme for str {
    fn graphemes_safe_first(&self) -> Option<&str> {
        segment_preserving(self).into_iter().next().map(|seg| &self[seg.start..seg.end]).or(None)
    }
}

fn control_glyph(byte: u8, fmt: &BinaryFormat) -> String {
    match byte {
        0x00..=0x1f => format!("^{}", (byte + 0x40) as char),
        0x7f => "^?".to_string(),
        _ => fmt.render(byte),
    }
}

/// Render one screen row's worth of `raw`, starting at byte 0, honoring
/// `cfg.shift`/`cfg.max_cols`/`cfg.chop_long_lines`. Stops at the first `\n`
/// (consumed but not emitted) or at end of input.
pub fn render_line(raw: &[u8], cfg: &RenderConfig) -> RenderedLine {
    let mut out = RenderedLine::default();
    let mut col: u32 = 0;
    let target_end = cfg.shift as u32 + cfg.max_cols as u32;
    let mut idx = 0usize;

    while idx < raw.len() {
        let byte = raw[idx];

        if byte == b'\n' {
            out.consumed = idx + 1;
            out.ended_in_newline = true;
            return out;
        }

        if byte == b'\r' {
            // Coalesce with a following LF, and drop a bare CR sitting right
            // before end-of-line (overstrike mode's carriage-return-as-reset).
            if raw.get(idx + 1) == Some(&b'\n') || idx + 1 >= raw.len() {
                idx += 1;
                continue;
            }
        }

        if byte == 0x1b && raw.get(idx + 1) == Some(&b'[') {
            if let Some(end) = scan_csi(raw, idx) {
                out.output.push(Output::Escape(RawEscape(raw[idx..end].to_vec())));
                idx = end;
                continue;
            }
        }

        if byte == 0x08 {
            // Overstrike: the previous cell and the next glyph combine.
            if let Some(Output::Cell(prev)) = out.output.last().cloned() {
                if let Some((next_text, next_end)) = decode_one_grapheme(raw, idx + 1) {
                    let attr = if prev.text == "_" || next_text == "_" {
                        CellAttr::UNDERLINE
                    } else if prev.text == next_text {
                        CellAttr::BOLD
                    } else {
                        CellAttr::STANDOUT
                    };
                    // `_\bX` or `X\b_` both underline; the surviving glyph is
                    // whichever side isn't the underscore.
                    let glyph = if attr == CellAttr::UNDERLINE && prev.text != "_" {
                        prev.text.clone()
                    } else {
                        next_text
                    };
                    let width = crate::egc_width(&glyph);
                    out.output.pop();
                    out.output.push(Output::Cell(Cell {
                        text: glyph,
                        width,
                        attr,
                    }));
                    idx = next_end;
                    continue;
                }
            }
            idx += 1;
            continue;
        }

        if byte == b'\t' {
            let stop = cfg.tab_stop.max(1) as u32;
            let next_stop = ((col / stop) + 1) * stop;
            while col < next_stop {
                if col >= cfg.shift as u32 {
                    if col >= target_end {
                        out.truncated = cfg.chop_long_lines;
                        out.consumed = idx;
                        return out;
                    }
                    out.output.push(Output::Cell(Cell {
                        text: " ".to_string(),
                        width: 1,
                        attr: CellAttr::empty(),
                    }));
                }
                col += 1;
            }
            idx += 1;
            continue;
        }

        let (text, width, next_idx) = if (0x20..0x7f).contains(&byte) || byte >= 0xC0 {
            match decode_one_grapheme(raw, idx) {
                Some((g, end)) => {
                    let w = crate::egc_width(&g);
                    (g, w, end)
                }
                None => (control_glyph(byte, &cfg.binary_fmt), 0, idx + 1),
            }
        } else {
            (control_glyph(byte, &cfg.binary_fmt), 0, idx + 1)
        };
        let glyph_width = if width == 0 { text.chars().count() as u16 } else { width };

        if col + glyph_width as u32 > target_end && col >= cfg.shift as u32 {
            out.truncated = cfg.chop_long_lines;
            out.consumed = idx;
            return out;
        }

        if col >= cfg.shift as u32 {
            out.output.push(Output::Cell(Cell {
                text,
                width: glyph_width,
                attr: CellAttr::empty(),
            }));
        }
        col += glyph_width as u32;
        idx = next_idx;
    }

    out.consumed = raw.len();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_cells(rl: &RenderedLine) -> Vec<String> {
        rl.output
            .iter()
            .filter_map(|o| match o {
                Output::Cell(c) => Some(c.text.clone()),
                Output::Escape(_) => None,
            })
            .collect()
    }

    #[test]
    fn ascii_line_stops_at_newline() {
        let rl = render_line(b"hello\nworld", &RenderConfig::default());
        assert_eq!(plain_cells(&rl).join(""), "hello");
        assert!(rl.ended_in_newline);
        assert_eq!(rl.consumed, 6);
    }

    #[test]
    fn tab_expands_to_next_stop() {
        let rl = render_line(b"a\tb", &RenderConfig::default());
        let cells = plain_cells(&rl);
        // 'a' then 7 spaces to reach column 8, then 'b'
        assert_eq!(cells.len(), 1 + 7 + 1);
        assert_eq!(cells.last().unwrap(), "b");
    }

    #[test]
    fn control_byte_renders_as_caret_notation() {
        let rl = render_line(b"a\x01b", &RenderConfig::default());
        let cells = plain_cells(&rl);
        assert_eq!(cells, vec!["a", "^A", "b"]);
    }

    #[test]
    fn bold_overstrike_merges_to_one_cell() {
        let rl = render_line(b"x\x08x", &RenderConfig::default());
        assert_eq!(rl.output.len(), 1);
        match &rl.output[0] {
            Output::Cell(c) => {
                assert_eq!(c.text, "x");
                assert!(c.attr.contains(CellAttr::BOLD));
            }
            _ => panic!("expected a cell"),
        }
    }

    #[test]
    fn underline_overstrike_uses_underscore_prefix() {
        let rl = render_line(b"_\x08x", &RenderConfig::default());
        match &rl.output[0] {
            Output::Cell(c) => {
                assert_eq!(c.text, "x");
                assert!(c.attr.contains(CellAttr::UNDERLINE));
            }
            _ => panic!("expected a cell"),
        }
    }

    #[test]
    fn underline_overstrike_uses_underscore_suffix() {
        let rl = render_line(b"y\x08_", &RenderConfig::default());
        match &rl.output[0] {
            Output::Cell(c) => {
                assert_eq!(c.text, "y");
                assert!(c.attr.contains(CellAttr::UNDERLINE));
            }
            _ => panic!("expected a cell"),
        }
    }

    #[test]
    fn carriage_return_before_newline_is_dropped() {
        let rl = render_line(b"A\r\nB\r\n", &RenderConfig::default());
        assert_eq!(plain_cells(&rl).join(""), "A");
        assert!(rl.ended_in_newline);
        assert_eq!(rl.consumed, 3);
    }

    #[test]
    fn ansi_sgr_sequence_passes_through_as_zero_width() {
        let raw = b"\x1b[31mred\x1b[0m";
        let rl = render_line(raw, &RenderConfig::default());
        let escapes: Vec<_> = rl
            .output
            .iter()
            .filter(|o| matches!(o, Output::Escape(_)))
            .collect();
        assert_eq!(escapes.len(), 2);
        assert_eq!(plain_cells(&rl).join(""), "red");
    }

    #[test]
    fn chop_long_lines_truncates_at_max_cols() {
        let cfg = RenderConfig {
            max_cols: 5,
            chop_long_lines: true,
            ..RenderConfig::default()
        };
        let rl = render_line(b"0123456789", &cfg);
        assert_eq!(plain_cells(&rl).join(""), "01234");
        assert!(rl.truncated);
    }

    #[test]
    fn shift_skips_leading_columns() {
        let cfg = RenderConfig {
            shift: 3,
            ..RenderConfig::default()
        };
        let rl = render_line(b"0123456789", &cfg);
        assert_eq!(plain_cells(&rl).join(""), "3456789");
    }

    #[test]
    fn invalid_utf8_byte_renders_via_binary_format() {
        let raw: &[u8] = &[b'a', 0xff, b'b'];
        let rl = render_line(raw, &RenderConfig::default());
        assert_eq!(plain_cells(&rl), vec!["a", "<FF>", "b"]);
    }

    #[test]
    fn wide_cjk_cell_reports_width_two() {
        let raw = "界".as_bytes();
        let rl = render_line(raw, &RenderConfig::default());
        match &rl.output[0] {
            Output::Cell(c) => assert_eq!(c.width, 2),
            _ => panic!("expected a cell"),
        }
    }
}
