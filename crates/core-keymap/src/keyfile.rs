//! Binary key-binding file format: `lesskey`-style compiled override files
//! loaded at startup (`$HOME/.lessrc` equivalent, plus a system-wide file).
//! A post-v241 file opens with magic `\0 M + G`, carries zero or more
//! tagged sections, and closes with magic `E n d`; a file that opens
//! without the magic is the older single-bare-command-table format and is
//! loaded as-is. Grounded on the original `decode.cpp`'s `lesskey()`/
//! `new_lesskey()`/`old_lesskey()`/`gint()`.

use crate::ActionTable;

const MAGIC: [u8; 4] = [0x00, b'M', b'+', b'G'];
const END_MAGIC: [u8; 3] = [b'E', b'n', b'd'];

const CMD_SECTION: u8 = b'c';
const EDIT_SECTION: u8 = b'e';
const VAR_SECTION: u8 = b'v';
const END_SECTION: u8 = b'x';

const KRADIX: u32 = 64;

/// The decoded tables from one key-binding file. `variables` holds raw
/// `name\0value\0` pairs from `v` sections (environment-variable-style
/// overrides), left undecoded since their shape belongs to `core-config`.
#[derive(Default)]
pub struct KeyFile {
    pub command_table: Option<ActionTable>,
    pub edit_table: Option<ActionTable>,
    pub variables: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum KeyFileError {
    #[error("key-binding file too short")]
    TooShort,
    #[error("key-binding file missing end marker")]
    MissingEndMarker,
    #[error("unrecognized section tag {0:#04x}")]
    BadSection(u8),
    #[error("section length runs past end of file")]
    Truncated,
}

/// Two bytes, low order first, radix 64: the length prefix of every
/// post-v241 section.
fn gint(bytes: &[u8], at: usize) -> Option<(u32, usize)> {
    let lo = *bytes.get(at)? as u32;
    let hi = *bytes.get(at + 1)? as u32;
    Some((lo + hi * KRADIX, at + 2))
}

/// Parse `buf` as a key-binding file, detecting new-vs-old format from the
/// leading magic bytes.
pub fn decode(buf: &[u8]) -> Result<KeyFile, KeyFileError> {
    if buf.len() < 3 {
        return Err(KeyFileError::TooShort);
    }
    if buf.len() >= 4 && buf[0..4] == MAGIC {
        decode_new(buf)
    } else {
        decode_old(buf)
    }
}

/// Pre-v241 file: one bare command table, no sections at all. A valid file
/// ends with `...,cmd,0,action` or `...,cmd,0,action|A_EXTRA,string,0`, so
/// the last or second-to-last byte must be NUL; we don't reject on that
/// here since `ActionTable::decode` already tolerates a missing trailing
/// `A_END_LIST`.
fn decode_old(buf: &[u8]) -> Result<KeyFile, KeyFileError> {
    Ok(KeyFile {
        command_table: Some(ActionTable::decode(buf)),
        edit_table: None,
        variables: Vec::new(),
    })
}

fn decode_new(buf: &[u8]) -> Result<KeyFile, KeyFileError> {
    if buf.len() < MAGIC.len() + END_MAGIC.len() || buf[buf.len() - 3..] != END_MAGIC {
        return Err(KeyFileError::MissingEndMarker);
    }
    let mut out = KeyFile::default();
    let mut p = MAGIC.len();
    loop {
        let tag = *buf.get(p).ok_or(KeyFileError::Truncated)?;
        p += 1;
        if tag == END_SECTION {
            return Ok(out);
        }
        let (len, after_len) = gint(buf, p).ok_or(KeyFileError::Truncated)?;
        let len = len as usize;
        let body_start = after_len;
        let body_end = body_start.checked_add(len).ok_or(KeyFileError::Truncated)?;
        if body_end > buf.len() - END_MAGIC.len() {
            return Err(KeyFileError::Truncated);
        }
        let body = &buf[body_start..body_end];
        match tag {
            CMD_SECTION => out.command_table = Some(ActionTable::decode(body)),
            EDIT_SECTION => out.edit_table = Some(ActionTable::decode(body)),
            VAR_SECTION => out.variables.extend_from_slice(body),
            _ => return Err(KeyFileError::BadSection(tag)),
        }
        p = body_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        let len = body.len() as u32;
        out.push((len % KRADIX) as u8);
        out.push((len / KRADIX) as u8);
        out.extend_from_slice(body);
        out
    }

    fn cmd_body() -> Vec<u8> {
        let mut b = b"j\x00\x01".to_vec();
        b.push(0x00); // A_END_LIST
        b
    }

    #[test]
    fn old_format_without_magic_loads_as_bare_command_table() {
        let buf = cmd_body();
        let kf = decode(&buf).unwrap();
        assert!(kf.command_table.is_some());
        assert!(kf.edit_table.is_none());
    }

    #[test]
    fn new_format_round_trips_a_command_section() {
        let mut buf = MAGIC.to_vec();
        buf.extend(section(CMD_SECTION, &cmd_body()));
        buf.extend(section(END_SECTION, &[]));
        buf.extend_from_slice(&END_MAGIC);
        let kf = decode(&buf).unwrap();
        assert!(kf.command_table.is_some());
    }

    #[test]
    fn new_format_collects_multiple_sections() {
        let mut buf = MAGIC.to_vec();
        buf.extend(section(CMD_SECTION, &cmd_body()));
        buf.extend(section(EDIT_SECTION, &cmd_body()));
        buf.extend(section(VAR_SECTION, b"FOO\x00bar\x00"));
        buf.extend(section(END_SECTION, &[]));
        buf.extend_from_slice(&END_MAGIC);
        let kf = decode(&buf).unwrap();
        assert!(kf.command_table.is_some());
        assert!(kf.edit_table.is_some());
        assert_eq!(kf.variables, b"FOO\x00bar\x00");
    }

    #[test]
    fn missing_end_magic_is_rejected() {
        let mut buf = MAGIC.to_vec();
        buf.extend(section(END_SECTION, &[]));
        buf.extend_from_slice(b"bad");
        assert!(matches!(decode(&buf), Err(KeyFileError::MissingEndMarker)));
    }

    #[test]
    fn unknown_section_tag_is_rejected() {
        let mut buf = MAGIC.to_vec();
        buf.extend(section(b'z', &[]));
        buf.extend_from_slice(&END_MAGIC);
        assert!(matches!(decode(&buf), Err(KeyFileError::BadSection(b'z'))));
    }

    #[test]
    fn length_prefix_is_low_byte_first_radix_64() {
        let (len, next) = gint(&[5, 1], 0).unwrap();
        assert_eq!(len, 5 + 64);
        assert_eq!(next, 2);
    }
}
