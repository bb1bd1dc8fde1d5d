//! Terminal capability probing.
//!
//! Records the small set of booleans the renderer / scheduler consult when
//! deciding whether to attempt scroll-region based optimizations or fall
//! back to full line clears. Detection runs once at startup and is meant to
//! be cheap; the struct is non-exhaustive so more capabilities can be added
//! without breaking downstream code.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    pub supports_scroll_region: bool,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        // Every terminal crossterm targets supports scroll regions in
        // practice; revisit with a probe sequence if that stops holding.
        Self {
            supports_scroll_region: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_sets_scroll_region_true() {
        let caps = TerminalCapabilities::detect();
        assert!(caps.supports_scroll_region);
    }
}
