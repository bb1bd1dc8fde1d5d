//! Position marks: named positions within a file, settable
//! with a lowercase letter and jumped to by name, plus the automatic marks
//! less maintains for you.

/// A remembered position: which file it belongs to (by ifile index) and the
/// byte offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkPosition {
    pub ifile: usize,
    pub pos: u64,
}

/// User marks are lowercase `a`-`z`; uppercase `A`-`Z` name the same slots
/// but are reserved (per less) for marks that survive across invocations via
/// history — both live in the same table here since persistence is handled
/// by whoever serializes it, not by this table's shape.
#[derive(Debug, Default)]
pub struct MarkTable {
    slots: std::collections::HashMap<char, MarkPosition>,
}

/// The automatic mark set just before a "large" movement (search, `G`, a
/// percent jump), addressed as `'` (single quote) as in less.
pub const PREVIOUS_MARK: char = '\'';

impl MarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_valid_name(c: char) -> bool {
        c.is_ascii_alphabetic() || c == PREVIOUS_MARK
    }

    pub fn set(&mut self, name: char, ifile: usize, pos: u64) -> bool {
        if !Self::is_valid_name(name) {
            return false;
        }
        self.slots.insert(name, MarkPosition { ifile, pos });
        true
    }

    /// Record the implicit "previous position" mark, overwriting whatever it
    /// held — called before any jump large enough that the user would want
    /// to back out of it with a single quote.
    pub fn set_previous(&mut self, ifile: usize, pos: u64) {
        self.slots.insert(PREVIOUS_MARK, MarkPosition { ifile, pos });
    }

    pub fn get(&self, name: char) -> Option<MarkPosition> {
        self.slots.get(&name).copied()
    }

    pub fn clear(&mut self, name: char) -> bool {
        self.slots.remove(&name).is_some()
    }

    /// Drop every mark pointing into a file that's left the ifile list.
    pub fn retain_ifiles(&mut self, still_valid: impl Fn(usize) -> bool) {
        self.slots.retain(|_, m| still_valid(m.ifile));
    }

    /// All marks currently set, for serializing to a history file.
    pub fn iter(&self) -> impl Iterator<Item = (char, MarkPosition)> + '_ {
        self.slots.iter().map(|(&name, &pos)| (name, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut marks = MarkTable::new();
        assert!(marks.set('a', 0, 1234));
        assert_eq!(
            marks.get('a'),
            Some(MarkPosition { ifile: 0, pos: 1234 })
        );
    }

    #[test]
    fn rejects_non_alphabetic_names() {
        let mut marks = MarkTable::new();
        assert!(!marks.set('1', 0, 0));
    }

    #[test]
    fn previous_mark_is_overwritten_not_accumulated() {
        let mut marks = MarkTable::new();
        marks.set_previous(0, 10);
        marks.set_previous(0, 20);
        assert_eq!(marks.get(PREVIOUS_MARK).unwrap().pos, 20);
    }

    #[test]
    fn retain_ifiles_drops_marks_for_removed_files() {
        let mut marks = MarkTable::new();
        marks.set('a', 0, 1);
        marks.set('b', 1, 2);
        marks.retain_ifiles(|idx| idx != 0);
        assert!(marks.get('a').is_none());
        assert!(marks.get('b').is_some());
    }
}
