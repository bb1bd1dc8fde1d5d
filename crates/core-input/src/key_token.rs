//! Translate crossterm's structured key/mouse events back into the raw byte
//! sequences the command dispatcher expects.
//!
//! The command dispatcher is a byte-sequence trie: it never sees a
//! decoded `KeyCode`, only bytes, the same way a real terminal driver hands
//! a pager one byte at a time. crossterm already did the hard work of
//! turning terminal escape sequences into structured events, so this module
//! undoes exactly enough of that to keep feeding the dispatcher what it
//! wants, without hand-rolling a second raw-tty reader.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Encode a key event as the bytes a terminal would have sent for it.
/// Returns an empty vec for events with no canonical byte encoding (key
/// release on platforms that report it; the dispatcher only acts on
/// presses and repeats).
pub fn key_event_bytes(ev: &KeyEvent) -> Vec<u8> {
    if ev.kind == crossterm::event::KeyEventKind::Release {
        return Vec::new();
    }
    let ctrl = ev.modifiers.contains(KeyModifiers::CONTROL);
    let alt = ev.modifiers.contains(KeyModifiers::ALT);
    let mut bytes = match ev.code {
        KeyCode::Char(c) => {
            if ctrl {
                ctrl_byte(c)
                    .map(|b| vec![b])
                    .unwrap_or_else(|| encode_char(c))
            } else {
                encode_char(c)
            }
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => vec![0x1b, b'[', b'Z'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => vec![0x1b, b'[', b'A'],
        KeyCode::Down => vec![0x1b, b'[', b'B'],
        KeyCode::Right => vec![0x1b, b'[', b'C'],
        KeyCode::Left => vec![0x1b, b'[', b'D'],
        KeyCode::Home => vec![0x1b, b'[', b'H'],
        KeyCode::End => vec![0x1b, b'[', b'F'],
        KeyCode::PageUp => vec![0x1b, b'[', b'5', b'~'],
        KeyCode::PageDown => vec![0x1b, b'[', b'6', b'~'],
        KeyCode::Insert => vec![0x1b, b'[', b'2', b'~'],
        KeyCode::Delete => vec![0x1b, b'[', b'3', b'~'],
        KeyCode::F(n) => function_key_bytes(n),
        _ => Vec::new(),
    };
    let is_arrow = matches!(
        ev.code,
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right
    );
    if alt && !bytes.is_empty() && !is_arrow {
        bytes.insert(0, 0x1b);
    }
    bytes
}

fn encode_char(c: char) -> Vec<u8> {
    let mut buf = [0u8; 4];
    c.encode_utf8(&mut buf).as_bytes().to_vec()
}

fn ctrl_byte(c: char) -> Option<u8> {
    let upper = c.to_ascii_uppercase();
    if ('A'..='Z').contains(&upper) {
        Some(upper as u8 - b'A' + 1)
    } else {
        match c {
            '[' => Some(0x1b),
            '\\' => Some(0x1c),
            ']' => Some(0x1d),
            '^' => Some(0x1e),
            '_' => Some(0x1f),
            '?' => Some(0x7f),
            _ => None,
        }
    }
}

fn function_key_bytes(n: u8) -> Vec<u8> {
    let code: &[u8] = match n {
        1 => b"11",
        2 => b"12",
        3 => b"13",
        4 => b"14",
        5 => b"15",
        6 => b"17",
        7 => b"18",
        8 => b"19",
        9 => b"20",
        10 => b"21",
        11 => b"23",
        12 => b"24",
        _ => return Vec::new(),
    };
    let mut v = vec![0x1b, b'['];
    v.extend_from_slice(code);
    v.push(b'~');
    v
}

/// Encode a mouse event as an SGR-1006 mouse report (`ESC [ < Cb ; Cx ; Cy M/m`),
/// the format the dispatcher's mouse-report parser understands.
pub fn mouse_event_bytes(ev: &MouseEvent) -> Vec<u8> {
    let (cb, is_press) = match ev.kind {
        MouseEventKind::Down(btn) => (button_code(btn), true),
        MouseEventKind::Up(btn) => (button_code(btn), false),
        MouseEventKind::Drag(btn) => (button_code(btn) + 32, true),
        MouseEventKind::ScrollUp => (64, true),
        MouseEventKind::ScrollDown => (65, true),
        MouseEventKind::Moved => (35, true),
    };
    let mut out = format!("\x1b[<{};{};{}", cb, ev.column + 1, ev.row + 1).into_bytes();
    out.push(if is_press { b'M' } else { b'm' });
    out
}

fn button_code(btn: MouseButton) -> u16 {
    match btn {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
    }
}
