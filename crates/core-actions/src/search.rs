//! Regex search compilation (spec §1 "search" navigation primitive). The
//! pattern text and leading modifiers come from a completed `Search`/
//! `Filter` prompt; this module only owns compiling them into something a
//! line can be tested against. Moving the read cursor to the next/previous
//! match is `core-model`'s job, since that crosses the cache/line-renderer
//! boundary this crate doesn't reach into.

use crate::prompt::SearchModifiers;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("bad search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A compiled search, ready to test rendered line text.
pub struct CompiledSearch {
    regex: regex::Regex,
    modifiers: SearchModifiers,
}

impl CompiledSearch {
    /// Compile `pattern` under `modifiers`. `ignore_case` reflects the
    /// option store's `-i`/`-I` setting at the moment the search was typed;
    /// `modifiers.no_regex` (`^E` in the prompt) falls back to literal
    /// substring matching via `regex::escape`.
    pub fn compile(pattern: &str, modifiers: SearchModifiers, ignore_case: bool) -> Result<Self, SearchError> {
        let body = if modifiers.no_regex {
            regex::escape(pattern)
        } else {
            pattern.to_string()
        };
        let mut builder = regex::RegexBuilder::new(&body);
        builder.case_insensitive(ignore_case);
        let regex = builder.build()?;
        Ok(Self { regex, modifiers })
    }

    /// Whether `line` should be treated as a match, honoring the `!`
    /// (invert) modifier: with invert set, a *non*-matching line counts.
    pub fn is_match(&self, line: &str) -> bool {
        let hit = self.regex.is_match(line);
        if self.modifiers.invert { !hit } else { hit }
    }

    /// Every match span in `line`, in column order, for hilite rendering.
    pub fn match_spans(&self, line: &str) -> Vec<(usize, usize)> {
        if self.modifiers.invert {
            return Vec::new();
        }
        self.regex
            .find_iter(line)
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}
